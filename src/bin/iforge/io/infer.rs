use std::path::Path;

use incar_forge::io::Format;

/// Format of a base-default file. INCAR files conventionally have no
/// extension, so anything that is not YAML is read as INCAR.
pub fn defaults_format(path: &Path) -> Format {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("yaml" | "yml") => Format::Yaml,
        _ => Format::Incar,
    }
}
