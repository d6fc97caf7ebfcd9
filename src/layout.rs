use serde_json::Value;

use crate::error::ContextError;
use crate::pdf::{BuiltinFont, PdfDocument};
use crate::report::VehicleReport;
use crate::revision::RevisionSection;

// All the geometry below is expressed in millimeters on an A4 portrait page.
// The vertical cursor grows downwards from the top edge; `pdf` expects
// positions from the bottom edge, so every emission converts at the last
// moment.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT_MARGIN: f32 = 15.0;
const POINT_INDENT: f32 = 6.0;
const TOP_MARGIN: f32 = 20.0;
/// Threshold for the cursor: a line whose baseline would land past this is
/// drawn on a fresh page instead.
const PAGE_BOTTOM_THRESHOLD: f32 = 270.0;
const LINE_HEIGHT: f32 = 7.0;
const SECTION_GAP: f32 = 4.0;

const HEADER_HEIGHT: f32 = 30.0;
const CARD_TOP: f32 = 40.0;
const CARD_HEIGHT: f32 = 35.0;
const CARD_CORNER_RADIUS: f32 = 3.0;
/// Where the flowing content starts below the fixed header and card.
const CONTENT_TOP: f32 = 85.0;

const BRAND_COLOR: [f32; 3] = [0.13, 0.32, 0.65];
const TITLE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const TEXT_COLOR: [f32; 3] = [0.15, 0.15, 0.15];
const LABEL_COLOR: [f32; 3] = [0.45, 0.45, 0.45];
const WARNING_COLOR: [f32; 3] = [0.78, 0.13, 0.13];

const HEADING_FONT_SIZE: f32 = 13.0;
const BODY_FONT_SIZE: f32 = 11.0;

/// The cursor the renderer moves down the page while emitting lines. Only the
/// flowing sections go through it; the header band and the vehicle card sit at
/// fixed positions outside of its budget.
struct LayoutCursor {
    page_index: usize,
    y: f32,
}

impl LayoutCursor {
    /// Makes room for one line: if the cursor has passed the bottom threshold
    /// a new page is started and the cursor resets to the top margin, before
    /// anything of that line is drawn. Returns the page the line must go to.
    fn claim_line(&mut self, document: &mut PdfDocument) -> usize {
        if self.y > PAGE_BOTTOM_THRESHOLD {
            self.page_index = document.add_page(PAGE_WIDTH, PAGE_HEIGHT);
            self.y = TOP_MARGIN;
        }
        self.page_index
    }
}

/// Renders the report and its normalized revision into a paginated PDF
/// document. The caller is expected to finalize and save the returned
/// document, conventionally under `report_file_name`.
pub fn render_report(
    report: &VehicleReport,
    normalized: &[RevisionSection],
) -> Result<PdfDocument, ContextError> {
    let mut document = PdfDocument::new(format!("informe-vehiculo-{}", report.vehicle.vin));
    let first_page = document.add_page(PAGE_WIDTH, PAGE_HEIGHT);

    draw_header_band(&mut document, first_page)?;
    draw_vehicle_card(&mut document, first_page, report)?;

    let mut cursor = LayoutCursor {
        page_index: first_page,
        y: CONTENT_TOP,
    };

    emit_line(
        &mut document,
        &mut cursor,
        "Puntos revisados",
        BuiltinFont::HelveticaBold,
        HEADING_FONT_SIZE,
        TEXT_COLOR,
        0.0,
    )?;
    for section in normalized {
        emit_line(
            &mut document,
            &mut cursor,
            &title_case(&section.seccion),
            BuiltinFont::HelveticaBold,
            BODY_FONT_SIZE,
            TEXT_COLOR,
            0.0,
        )?;
        for punto in &section.puntos {
            emit_line(
                &mut document,
                &mut cursor,
                &point_text(punto),
                BuiltinFont::Helvetica,
                BODY_FONT_SIZE,
                TEXT_COLOR,
                POINT_INDENT,
            )?;
        }
        cursor.y += SECTION_GAP;
    }

    cursor.y += SECTION_GAP;
    emit_line(
        &mut document,
        &mut cursor,
        "Errores detectados",
        BuiltinFont::HelveticaBold,
        HEADING_FONT_SIZE,
        TEXT_COLOR,
        0.0,
    )?;
    if report.errors.is_empty() {
        emit_line(
            &mut document,
            &mut cursor,
            "Sin errores registrados",
            BuiltinFont::Helvetica,
            BODY_FONT_SIZE,
            TEXT_COLOR,
            POINT_INDENT,
        )?;
    }
    for error_code in &report.errors {
        emit_line(
            &mut document,
            &mut cursor,
            error_code,
            BuiltinFont::Helvetica,
            BODY_FONT_SIZE,
            WARNING_COLOR,
            POINT_INDENT,
        )?;
    }

    Ok(document)
}

/// The conventional file name for a rendered report.
pub fn report_file_name(vin: &str) -> String {
    format!("informe-vehiculo-{vin}.pdf")
}

/// Emits one line through the cursor, page-breaking first when needed.
fn emit_line(
    document: &mut PdfDocument,
    cursor: &mut LayoutCursor,
    text: &str,
    font: BuiltinFont,
    font_size: f32,
    color: [f32; 3],
    indent: f32,
) -> Result<(), ContextError> {
    let page_index = cursor.claim_line(document);
    document.write_text(
        page_index,
        text,
        font,
        font_size,
        color,
        [LEFT_MARGIN + indent, PAGE_HEIGHT - cursor.y],
    )?;
    cursor.y += LINE_HEIGHT;

    Ok(())
}

/// The fixed colored band with the centered document title. Page 1 only, does
/// not consume cursor budget.
fn draw_header_band(document: &mut PdfDocument, page_index: usize) -> Result<(), ContextError> {
    document.fill_rectangle(
        page_index,
        [0.0, PAGE_HEIGHT - HEADER_HEIGHT],
        [PAGE_WIDTH, HEADER_HEIGHT],
        BRAND_COLOR,
    )?;
    let title = "Informe del Vehiculo";
    // The standard fonts ship no width tables here, so centering works from
    // an average glyph width for Helvetica-Bold at this size.
    let approximate_title_width = title.chars().count() as f32 * 3.0;
    document.write_text(
        page_index,
        title,
        BuiltinFont::HelveticaBold,
        16.0,
        TITLE_COLOR,
        [
            (PAGE_WIDTH - approximate_title_width) / 2.0,
            PAGE_HEIGHT - HEADER_HEIGHT / 2.0 - 2.0,
        ],
    )
}

/// The rounded vehicle-information card: two fixed rows of three label/value
/// pairs each. It never scrolls or grows, long values are simply wider.
fn draw_vehicle_card(
    document: &mut PdfDocument,
    page_index: usize,
    report: &VehicleReport,
) -> Result<(), ContextError> {
    document.stroke_rounded_rectangle(
        page_index,
        [LEFT_MARGIN - 3.0, PAGE_HEIGHT - CARD_TOP - CARD_HEIGHT],
        [PAGE_WIDTH - 2.0 * (LEFT_MARGIN - 3.0), CARD_HEIGHT],
        CARD_CORNER_RADIUS,
        0.4,
        LABEL_COLOR,
    )?;

    let vehicle = &report.vehicle;
    let first_row = [
        ("Marca", vehicle.make.clone()),
        ("Modelo", vehicle.model.clone()),
        ("Año", vehicle.year.to_string()),
    ];
    let second_row = [
        ("VIN", vehicle.vin.clone()),
        ("Velocidad", format!("{} km/h", vehicle.speed)),
        ("RPM", vehicle.rpm.to_string()),
    ];

    let column_width = (PAGE_WIDTH - 2.0 * LEFT_MARGIN) / 3.0;
    for (row_index, row) in [first_row, second_row].iter().enumerate() {
        let label_y = CARD_TOP + 9.0 + row_index as f32 * 15.0;
        for (column_index, (label, value)) in row.iter().enumerate() {
            let x = LEFT_MARGIN + column_index as f32 * column_width;
            document.write_text(
                page_index,
                label,
                BuiltinFont::HelveticaBold,
                9.0,
                LABEL_COLOR,
                [x, PAGE_HEIGHT - label_y],
            )?;
            document.write_text(
                page_index,
                value,
                BuiltinFont::Helvetica,
                BODY_FONT_SIZE,
                TEXT_COLOR,
                [x, PAGE_HEIGHT - label_y - 6.0],
            )?;
        }
    }

    Ok(())
}

/// Converts a section name to Title Case: the first letter of each word is
/// upper-cased and the remainder lower-cased.
fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                None => String::new(),
                Some(first) => first
                    .to_uppercase()
                    .chain(characters.flat_map(char::to_lowercase))
                    .collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text for one revision point. Strings are rendered verbatim; any other JSON
/// value is rendered in its compact JSON form.
fn point_text(punto: &Value) -> String {
    match punto {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::report::VehicleInfo;

    fn sample_report(errors: Vec<String>) -> VehicleReport {
        VehicleReport {
            vehicle: VehicleInfo {
                make: "Seat".into(),
                model: "Leon".into(),
                year: 2016,
                vin: "VSSZZZ5FZGR123456".into(),
                speed: 120,
                rpm: 3200,
                revision: Value::Null,
            },
            errors,
        }
    }

    #[test]
    fn title_case_handles_multiple_words() {
        assert_eq!(title_case("frenos"), "Frenos");
        assert_eq!(title_case("luces DELANTERAS"), "Luces Delanteras");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn the_file_name_embeds_the_vin() {
        assert_eq!(
            report_file_name("VSSZZZ5FZGR123456"),
            "informe-vehiculo-VSSZZZ5FZGR123456.pdf"
        );
    }

    #[test]
    fn non_string_points_render_as_compact_json() {
        assert_eq!(point_text(&Value::String("pastillas ok".into())), "pastillas ok");
        assert_eq!(point_text(&serde_json::json!({"nivel": 3})), "{\"nivel\":3}");
        assert_eq!(point_text(&Value::from(4)), "4");
    }

    #[test]
    fn a_short_report_stays_on_one_page() {
        let report = sample_report(vec!["P0301".into()]);
        let normalized = vec![RevisionSection {
            seccion: "frenos".into(),
            puntos: vec![Value::String("pastillas ok".into())],
        }];
        let document = render_report(&report, &normalized).unwrap();
        assert_eq!(document.page_count(), 1);
    }

    #[test]
    fn an_overflowing_points_section_breaks_exactly_once_at_the_threshold() {
        let points: Vec<Value> = (0..40)
            .map(|index| Value::String(format!("punto {index}")))
            .collect();
        let normalized = vec![RevisionSection {
            seccion: "motor".into(),
            puntos: points,
        }];
        let report = sample_report(Vec::new());
        let document = render_report(&report, &normalized).unwrap();

        // Walk the cursor the way the renderer does to find how many flowing
        // lines fit on the first page: lines start at CONTENT_TOP and a line
        // is emitted only while the cursor has not passed the threshold.
        let mut y = CONTENT_TOP;
        let mut lines_on_first_page = 0;
        while y <= PAGE_BOTTOM_THRESHOLD {
            lines_on_first_page += 1;
            y += LINE_HEIGHT;
        }

        assert_eq!(document.page_count(), 2);

        // Page 1 carries the fixed header and card fragments (1 title + 12
        // card entries) plus the flowing lines; page 2 continues with the
        // remaining lines at the top margin, nothing is lost in between.
        let first_page_fragments = document.pages()[0].text_fragments();
        let second_page_fragments = document.pages()[1].text_fragments();
        assert_eq!(first_page_fragments.len(), 13 + lines_on_first_page);

        // The flowing lines are the block heading, the section heading and the
        // 40 points, plus the errors block at the end.
        let flowing_on_first = lines_on_first_page;
        let first_overflowed_point = flowing_on_first - 2; // minus the two headings
        assert_eq!(
            second_page_fragments[0],
            format!("punto {first_overflowed_point}")
        );

        let all_fragments: Vec<String> = first_page_fragments
            .into_iter()
            .chain(second_page_fragments)
            .collect();
        let point_lines = all_fragments
            .iter()
            .filter(|fragment| fragment.starts_with("punto "))
            .count();
        assert_eq!(point_lines, 40);
    }

    #[test]
    fn error_lines_follow_the_points_section() {
        let report = sample_report(vec!["P0301".into(), "P0420".into()]);
        let normalized = vec![RevisionSection {
            seccion: "frenos".into(),
            puntos: vec![Value::String("pastillas ok".into())],
        }];
        let document = render_report(&report, &normalized).unwrap();
        let fragments = document.pages()[0].text_fragments();

        let errors_heading = fragments
            .iter()
            .position(|fragment| fragment == "Errores detectados")
            .unwrap();
        assert_eq!(fragments[errors_heading + 1], "P0301");
        assert_eq!(fragments[errors_heading + 2], "P0420");
    }

    #[test]
    fn an_empty_errors_sequence_renders_a_placeholder_line() {
        let report = sample_report(Vec::new());
        let document = render_report(&report, &[]).unwrap();
        let fragments = document.pages()[0].text_fragments();
        assert!(fragments.contains(&"Sin errores registrados".to_string()));
    }
}
