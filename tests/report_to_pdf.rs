use similar_asserts::assert_eq;

use informe::layout;
use informe::report::VehicleReport;
use informe::revision;

/// A payload in the exact shape `GET /informe/{token}` answers with for the
/// token "abc123": two revision sections (three and one points) and two
/// detected errors. The revision is the stringified single-quoted variant.
const ABC123_PAYLOAD: &str = r#"{
    "vehiculo": {
        "marca": "Seat",
        "modelo": "Leon",
        "year": 2016,
        "vin": "VSSZZZ5FZGR123456",
        "rpm": 780,
        "velocidad": 0,
        "revision": "{'frenos': ['pastillas ok', 'discos ok', 'liquido ok'], 'motor': ['compresion ok']}"
    },
    "errores": ["P0301", "P0420"]
}"#;

#[test]
fn a_fetched_report_renders_into_a_complete_document() {
    let report: VehicleReport = serde_json::from_str(ABC123_PAYLOAD).unwrap();
    let normalized = revision::normalize(&report.vehicle.revision);

    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].seccion, "frenos");
    assert_eq!(normalized[0].puntos.len(), 3);
    assert_eq!(normalized[1].seccion, "motor");
    assert_eq!(normalized[1].puntos.len(), 1);

    let document = layout::render_report(&report, &normalized).unwrap();
    assert_eq!(document.page_count(), 1);

    let fragments = document.pages()[0].text_fragments();

    // The section headings are title-cased.
    assert!(fragments.contains(&"Frenos".to_string()));
    assert!(fragments.contains(&"Motor".to_string()));

    // All four point lines are present.
    for punto in ["pastillas ok", "discos ok", "liquido ok", "compresion ok"] {
        assert!(
            fragments.contains(&punto.to_string()),
            "missing point line {punto:?}"
        );
    }

    // Both error lines are present, after the errors heading.
    let errors_heading = fragments
        .iter()
        .position(|fragment| fragment == "Errores detectados")
        .unwrap();
    assert_eq!(fragments[errors_heading + 1], "P0301");
    assert_eq!(fragments[errors_heading + 2], "P0420");

    // The conventional file name embeds the VIN.
    assert_eq!(
        layout::report_file_name(&report.vehicle.vin),
        "informe-vehiculo-VSSZZZ5FZGR123456.pdf"
    );
}

#[test]
fn a_rendered_report_serializes_to_a_loadable_pdf() {
    let report: VehicleReport = serde_json::from_str(ABC123_PAYLOAD).unwrap();
    let normalized = revision::normalize(&report.vehicle.revision);

    let mut document = layout::render_report(&report, &normalized).unwrap();
    document
        .write_all("00000000000000000000000000000000".to_string())
        .unwrap();
    document.optimize();
    let bytes = document.save_to_bytes().unwrap();

    let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(reloaded.get_pages().len(), 1);
}

#[test]
fn a_corrupt_revision_still_renders_the_errors() {
    // An apostrophe inside a point corrupts the quote substitution; the
    // revision is absorbed into an empty one and the rest still renders.
    let payload = ABC123_PAYLOAD.replace("pastillas ok", "driver's seat");
    let report: VehicleReport = serde_json::from_str(&payload).unwrap();
    let normalized = revision::normalize(&report.vehicle.revision);
    assert!(normalized.is_empty());

    let document = layout::render_report(&report, &normalized).unwrap();
    let fragments = document.pages()[0].text_fragments();
    assert!(fragments.contains(&"P0301".to_string()));
    assert!(fragments.contains(&"Errores detectados".to_string()));
}
