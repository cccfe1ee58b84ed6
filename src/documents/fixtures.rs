//! Minimal Office packages built in memory for loader tests

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const NS_MAIN_SHEET: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

fn package(parts: Vec<(String, String)>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Cell styles written to every workbook: general, `m/d/yyyy`, `m/d/yyyy h:mm`
const STYLES: &str = r#"<cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs>"#;

/// Workbook with the given sheets. Empty strings leave the cell out,
/// numeric strings become number cells, and `date:<serial>` /
/// `datetime:<serial>` become number cells with a date format.
pub fn xlsx(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    let mut parts = Vec::new();
    let mut sheet_entries = String::new();
    let mut rels = String::new();

    for (i, (name, rows)) in sheets.iter().enumerate() {
        let n = i + 1;
        sheet_entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape(name),
            n,
            n
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, NS_REL, n
        ));

        let mut data = String::new();
        for (r, row) in rows.iter().enumerate() {
            data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let cell_ref = format!("{}{}", column_letter(c), r + 1);
                let dated = [("date:", 1), ("datetime:", 2)]
                    .iter()
                    .find_map(|(prefix, style)| value.strip_prefix(prefix).map(|v| (v, style)));
                if let Some((serial, style)) = dated {
                    data.push_str(&format!(
                        r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                        cell_ref, style, serial
                    ));
                } else if value.parse::<f64>().is_ok() {
                    data.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value));
                } else {
                    data.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        cell_ref,
                        escape(value)
                    ));
                }
            }
            data.push_str("</row>");
        }
        parts.push((
            format!("xl/worksheets/sheet{}.xml", n),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{}"><sheetData>{}</sheetData></worksheet>"#,
                NS_MAIN_SHEET, data
            ),
        ));
    }

    parts.push((
        "[Content_Types].xml".to_string(),
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#.to_string(),
    ));
    parts.push((
        "_rels/.rels".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
            NS_PKG_REL, NS_REL
        ),
    ));
    parts.push((
        "xl/workbook.xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets></workbook>"#,
            NS_MAIN_SHEET, NS_REL, sheet_entries
        ),
    ));
    rels.push_str(&format!(
        r#"<Relationship Id="rIdStyles" Type="{}/styles" Target="styles.xml"/>"#,
        NS_REL
    ));
    parts.push((
        "xl/_rels/workbook.xml.rels".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">{}</Relationships>"#,
            NS_PKG_REL, rels
        ),
    ));
    parts.push((
        "xl/styles.xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="{}">{}</styleSheet>"#,
            NS_MAIN_SHEET, STYLES
        ),
    ));

    package(parts)
}

/// Presentation whose slides hold text shapes, each shape a list of paragraphs.
/// Slides are stored in reverse part order so tests can tell presentation
/// order from file-name order.
pub fn pptx(slides: &[Vec<Vec<&str>>]) -> Vec<u8> {
    let mut parts = Vec::new();
    let mut slide_ids = String::new();
    let mut rels = String::new();
    let count = slides.len();

    for (i, shapes) in slides.iter().enumerate() {
        let part_number = count - i;
        let rel_id = format!("rId{}", i + 10);
        slide_ids.push_str(&format!(
            r#"<p:sldId id="{}" r:id="{}"/>"#,
            256 + i,
            rel_id
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
            rel_id, NS_REL, part_number
        ));

        let mut tree = String::from(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr>"#);
        for paragraphs in shapes.iter() {
            tree.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text"/></p:nvSpPr><p:txBody><a:bodyPr/>"#);
            for paragraph in paragraphs.iter() {
                if paragraph.is_empty() {
                    tree.push_str("<a:p/>");
                } else {
                    tree.push_str(&format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(paragraph)));
                }
            }
            tree.push_str("</p:txBody></p:sp>");
        }
        // pictures carry no text frame
        tree.push_str(r#"<p:pic><p:nvPicPr><p:cNvPr id="9" name="Picture"/></p:nvPicPr></p:pic>"#);

        parts.push((
            format!("ppt/slides/slide{}.xml", part_number),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                NS_DRAWING, NS_REL, NS_PRESENTATION, tree
            ),
        ));
    }

    parts.push((
        "ppt/presentation.xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            NS_DRAWING, NS_REL, NS_PRESENTATION, slide_ids
        ),
    ));
    parts.push((
        "ppt/_rels/presentation.xml.rels".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">{}</Relationships>"#,
            NS_PKG_REL, rels
        ),
    ));

    package(parts)
}

/// Word document with one paragraph per entry
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};

    let mut doc = Docx::new();
    for text in paragraphs {
        let paragraph = if text.is_empty() {
            Paragraph::new()
        } else {
            Paragraph::new().add_run(Run::new().add_text(*text))
        };
        doc = doc.add_paragraph(paragraph);
    }

    let mut cursor = Cursor::new(Vec::new());
    doc.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

/// PDF with one Helvetica text line per page. Offsets in the xref table are
/// computed from the assembled body, so the file parses without repair.
pub fn pdf(pages: &[&str]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (text, page_id) in pages.iter().zip(&page_ids) {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));
    out.into_bytes()
}
