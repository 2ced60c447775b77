use super::util::{encode_run_length, format_real, parse_real};
use crate::io::{Format, error::Error};
use crate::model::document::{NormalizedDocument, RawDocument};
use crate::model::value::{CanonicalSiteArray, RawValue, TagValue};
use std::io::{BufRead, Write};

/// Reads INCAR text into a raw document.
///
/// Statements are `TAG = value`, separated by newlines or `;`. Text after
/// `#` or `!` is a comment. Multi-token values become a list when every
/// token is numeric; anything containing run-length tokens (`3*0.0`) stays a
/// string so site tags pass it through unexpanded.
pub fn read_incar<R: BufRead>(reader: R) -> Result<RawDocument, Error> {
    let mut document = RawDocument::new();
    for (line_no, line) in collect_lines(reader)? {
        for statement in strip_comment(&line).split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            let (key, value) = statement.split_once('=').ok_or_else(|| {
                Error::parse(
                    Format::Incar,
                    line_no,
                    format!("expected 'TAG = value', found '{statement}'"),
                )
            })?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(Error::parse(
                    Format::Incar,
                    line_no,
                    format!("invalid tag name '{key}'"),
                ));
            }
            document.push(key, parse_value(value.trim()));
        }
    }
    Ok(document)
}

/// Writes one `TAG = value` line per tag, in canonical tag order.
pub fn write_incar<W: Write>(mut writer: W, document: &NormalizedDocument) -> Result<(), Error> {
    for (tag, entry) in document {
        writeln!(writer, "{tag} = {}", render_value(&entry.value))?;
    }
    Ok(())
}

/// Renders a tag value in INCAR notation.
///
/// Site arrays are flattened in site order and run-length encoded; raw
/// site tokens are emitted verbatim.
pub fn render_value(value: &TagValue) -> String {
    match value {
        TagValue::Bool(true) => ".TRUE.".to_string(),
        TagValue::Bool(false) => ".FALSE.".to_string(),
        TagValue::Int(i) => i.to_string(),
        TagValue::Float(f) => format_real(*f),
        TagValue::Text(s) => s.clone(),
        TagValue::Vector(v) => v
            .iter()
            .map(|x| format_real(*x))
            .collect::<Vec<_>>()
            .join(" "),
        TagValue::Sites(CanonicalSiteArray::Raw(tokens)) => tokens.clone(),
        TagValue::Sites(array) => encode_run_length(&array.flatten()),
    }
}

fn collect_lines<R: BufRead>(reader: R) -> Result<Vec<(usize, String)>, Error> {
    reader
        .lines()
        .enumerate()
        .map(|(i, line)| {
            line.map(|v| (i + 1, v))
                .map_err(|e| Error::Io { source: e })
        })
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find(['#', '!']) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_value(text: &str) -> RawValue {
    if let Some(inner) = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return RawValue::Str(inner.to_string());
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [] => RawValue::Str(String::new()),
        [single] => parse_token(single),
        many if many.iter().any(|t| t.contains('*')) => RawValue::Str(many.join(" ")),
        many => {
            let numbers: Option<Vec<RawValue>> = many
                .iter()
                .map(|t| Some(parse_token(t)).filter(RawValue::is_number))
                .collect();
            numbers
                .map(RawValue::List)
                .unwrap_or_else(|| RawValue::Str(many.join(" ")))
        }
    }
}

fn parse_token(token: &str) -> RawValue {
    match token.to_ascii_uppercase().as_str() {
        ".TRUE." | ".T." | "T" | "TRUE" => return RawValue::Bool(true),
        ".FALSE." | ".F." | "F" | "FALSE" => return RawValue::Bool(false),
        _ => {}
    }
    if let Ok(i) = token.parse::<i64>() {
        return RawValue::Int(i);
    }
    match parse_real(token) {
        Some(f) => RawValue::Float(f),
        None => RawValue::Str(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::Provenance;
    use crate::model::tag::Tag;
    use std::io::Cursor;

    fn read(text: &str) -> RawDocument {
        read_incar(Cursor::new(text)).unwrap()
    }

    #[test]
    fn reads_statements_comments_and_separators() {
        let doc = read(
            "SYSTEM = \"CaTiO3 relax\"\n\
             # full-line comment\n\
             ENCUT = 520 ! trailing comment\n\
             ISPIN = 2; LORBIT = 11\n\
             \n\
             EDIFF = 1.0d-6\n",
        );
        let entries: Vec<_> = doc.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("SYSTEM", &RawValue::Str("CaTiO3 relax".into())),
                ("ENCUT", &RawValue::Int(520)),
                ("ISPIN", &RawValue::Int(2)),
                ("LORBIT", &RawValue::Int(11)),
                ("EDIFF", &RawValue::Float(1e-6)),
            ]
        );
    }

    #[test]
    fn boolean_spellings() {
        let doc = read("LWAVE = .FALSE.\nLCHARG = T\nLASPH = .true.\nLDAU = f\n");
        let values: Vec<_> = doc.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(
            values,
            vec![
                RawValue::Bool(false),
                RawValue::Bool(true),
                RawValue::Bool(true),
                RawValue::Bool(false),
            ]
        );
    }

    #[test]
    fn multi_token_values() {
        let doc = read("MAGMOM = 1*0.0 1*2.0 3*0.0\nLDAUU = 0 4.0 0\nALGO = Very Fast\n");
        let values: Vec<_> = doc.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(values[0], RawValue::Str("1*0.0 1*2.0 3*0.0".into()));
        assert_eq!(
            values[1],
            RawValue::List(vec![
                RawValue::Int(0),
                RawValue::Float(4.0),
                RawValue::Int(0)
            ])
        );
        assert_eq!(values[2], RawValue::Str("Very Fast".into()));
    }

    #[test]
    fn missing_equals_reports_the_line() {
        let err = read_incar(Cursor::new("ENCUT = 520\nISPIN 2\n")).unwrap_err();
        match err {
            Error::Parse { format, line, .. } => {
                assert_eq!(format, Format::Incar);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn writes_sorted_lines_with_incar_notation() {
        let mut doc = NormalizedDocument::new();
        doc.insert(Tag::new("LWAVE"), TagValue::Bool(false), Provenance::Explicit);
        doc.insert(Tag::new("ENCUT"), TagValue::Float(520.0), Provenance::Explicit);
        doc.insert(
            Tag::new("MAGMOM"),
            TagValue::Sites(CanonicalSiteArray::Scalars(vec![0.0, 2.0, 0.0, 0.0, 0.0])),
            Provenance::Explicit,
        );
        doc.insert(
            Tag::new("SAXIS"),
            TagValue::Vector(vec![0.0, 0.0, 1.0]),
            Provenance::FromDefault,
        );

        let mut out = Vec::new();
        write_incar(&mut out, &doc).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ENCUT = 520.0\n\
             LWAVE = .FALSE.\n\
             MAGMOM = 1*0.0 1*2.0 3*0.0\n\
             SAXIS = 0.0 0.0 1.0\n"
        );
    }

    #[test]
    fn vector_sites_flatten_and_raw_tokens_pass_through() {
        let vectors = TagValue::Sites(CanonicalSiteArray::Vectors(vec![
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ]));
        assert_eq!(render_value(&vectors), "2*0.0 1*1.0 2*0.0 1*1.0");

        let raw = TagValue::Sites(CanonicalSiteArray::Raw("4*0.0 1*5.0".into()));
        assert_eq!(render_value(&raw), "4*0.0 1*5.0");
    }

    #[test]
    fn written_site_arrays_read_back_as_raw_tokens() {
        let mut doc = NormalizedDocument::new();
        doc.insert(
            Tag::new("MAGMOM"),
            TagValue::Sites(CanonicalSiteArray::Scalars(vec![1.0, 1.0, -1.0])),
            Provenance::Explicit,
        );
        let mut out = Vec::new();
        write_incar(&mut out, &doc).unwrap();

        let back = read_incar(Cursor::new(out)).unwrap();
        assert_eq!(
            back.iter().next(),
            Some(("MAGMOM", &RawValue::Str("2*1.0 1*-1.0".into())))
        );
    }
}
