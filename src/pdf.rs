use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use std::io::BufWriter;
use std::mem;
use std::path::Path;

use crate::error::ContextError;

/// The standard Type1 fonts used by the report. These are guaranteed by the
/// PDF specification to be available in every conforming reader, so no font
/// program has to be embedded into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    /// The name under which the font is registered in the page resources.
    fn resource_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F0",
            BuiltinFont::HelveticaBold => "F1",
        }
    }

    /// The `BaseFont` name from the standard 14 set.
    fn base_font(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    const ALL: [BuiltinFont; 2] = [BuiltinFont::Helvetica, BuiltinFont::HelveticaBold];
}

/// The representation of a PDF page: its size in millimeters and the content
/// stream operations accumulated for it.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// The index of the page in the document, starting from 1.
    pub(crate) number: usize,
    /// Page width in points.
    width: f32,
    /// Page height in points.
    height: f32,
    /// The content stream operations of the page.
    operations: Vec<Operation>,
}

impl PdfPage {
    /// Returns the text fragments written to this page, in drawing order.
    /// The inverse of the WinAnsi encoding applied by `write_text`, mainly
    /// useful for inspecting a document before it is serialized.
    pub fn text_fragments(&self) -> Vec<String> {
        self.operations
            .iter()
            .filter(|operation| operation.operator == "Tj")
            .filter_map(|operation| match operation.operands.first() {
                Some(Object::String(bytes, _)) => {
                    Some(bytes.iter().map(|&byte| byte as char).collect())
                }
                _ => None,
            })
            .collect()
    }
}

/// This struct represents the PDF document on a high-level, as a list of pages
/// to which text and simple vector shapes are written. `write_all` assembles
/// the underlying `lopdf::Document` from it, which can then be saved.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be
    /// directly interacted with unless strictly necessary.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, used for the PDF `ID` tag.
    pub identifier: String,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to
    /// version 1.5 of the PDF specification.
    pub fn new(pdf_document_identifier: String) -> Self {
        PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier,
            pages: Vec::new(),
        }
    }

    /// Adds a page of the given width and height in millimeters and returns its
    /// index, to be passed to the writing functions.
    pub fn add_page(&mut self, page_width: f32, page_height: f32) -> usize {
        let pdf_page = PdfPage {
            number: self.pages.len() + 1,
            width: millimeters_to_points(page_width),
            height: millimeters_to_points(page_height),
            operations: Vec::new(),
        };
        self.pages.push(pdf_page);

        self.pages.len() - 1
    }

    /// The number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The pages added so far.
    pub fn pages(&self) -> &[PdfPage] {
        &self.pages
    }

    /// Writes the text in the given font, size and fill color at the given
    /// position, expressed in millimeters from the bottom-left corner of the
    /// page as the PDF coordinate system expects.
    ///
    /// The text is NFC-normalized and encoded for the WinAnsi (Latin-1)
    /// encoding of the standard fonts; characters outside of it are replaced
    /// with a question mark and logged.
    pub fn write_text(
        &mut self,
        page_index: usize,
        text: &str,
        font: BuiltinFont,
        font_size: f32,
        color: [f32; 3],
        caret_position: [f32; 2],
    ) -> Result<(), ContextError> {
        let encoded_text = encode_win_ansi(text);
        let [x, y] = caret_position;
        let [r, g, b] = color;
        self.add_operations(
            page_index,
            vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), font_size.into()],
                ),
                Operation::new(
                    "Td",
                    vec![
                        millimeters_to_points(x).into(),
                        millimeters_to_points(y).into(),
                    ],
                ),
                Operation::new(
                    "rg",
                    vec![r, g, b].into_iter().map(Object::Real).collect(),
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(encoded_text, StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        )
    }

    /// Fills a rectangle of the given size with the given color. The position
    /// is the bottom-left corner of the rectangle in millimeters.
    pub fn fill_rectangle(
        &mut self,
        page_index: usize,
        position: [f32; 2],
        size: [f32; 2],
        color: [f32; 3],
    ) -> Result<(), ContextError> {
        let [x, y] = position.map(millimeters_to_points);
        let [width, height] = size.map(millimeters_to_points);
        let [r, g, b] = color;
        self.add_operations(
            page_index,
            vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "rg",
                    vec![r, g, b].into_iter().map(Object::Real).collect(),
                ),
                Operation::new(
                    "re",
                    vec![x.into(), y.into(), width.into(), height.into()],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Strokes a rectangle with rounded corners, used for the vehicle card.
    /// The corners are approximated with cubic Bezier arcs.
    pub fn stroke_rounded_rectangle(
        &mut self,
        page_index: usize,
        position: [f32; 2],
        size: [f32; 2],
        corner_radius: f32,
        line_width: f32,
        color: [f32; 3],
    ) -> Result<(), ContextError> {
        let [x, y] = position.map(millimeters_to_points);
        let [width, height] = size.map(millimeters_to_points);
        let radius = millimeters_to_points(corner_radius);
        // The distance from an arc endpoint to its control point for a
        // quarter-circle Bezier approximation.
        let kappa = 0.552_285 * radius;
        let [r, g, b] = color;

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "RG",
                vec![r, g, b].into_iter().map(Object::Real).collect(),
            ),
            Operation::new("w", vec![millimeters_to_points(line_width).into()]),
            Operation::new("m", vec![(x + radius).into(), y.into()]),
        ];
        // Bottom edge and bottom-right corner.
        operations.push(Operation::new(
            "l",
            vec![(x + width - radius).into(), y.into()],
        ));
        operations.push(Operation::new(
            "c",
            vec![
                (x + width - radius + kappa).into(),
                y.into(),
                (x + width).into(),
                (y + radius - kappa).into(),
                (x + width).into(),
                (y + radius).into(),
            ],
        ));
        // Right edge and top-right corner.
        operations.push(Operation::new(
            "l",
            vec![(x + width).into(), (y + height - radius).into()],
        ));
        operations.push(Operation::new(
            "c",
            vec![
                (x + width).into(),
                (y + height - radius + kappa).into(),
                (x + width - radius + kappa).into(),
                (y + height).into(),
                (x + width - radius).into(),
                (y + height).into(),
            ],
        ));
        // Top edge and top-left corner.
        operations.push(Operation::new(
            "l",
            vec![(x + radius).into(), (y + height).into()],
        ));
        operations.push(Operation::new(
            "c",
            vec![
                (x + radius - kappa).into(),
                (y + height).into(),
                x.into(),
                (y + height - radius + kappa).into(),
                x.into(),
                (y + height - radius).into(),
            ],
        ));
        // Left edge and bottom-left corner, then close and stroke.
        operations.push(Operation::new("l", vec![x.into(), (y + radius).into()]));
        operations.push(Operation::new(
            "c",
            vec![
                x.into(),
                (y + radius - kappa).into(),
                (x + radius - kappa).into(),
                y.into(),
                (x + radius).into(),
                y.into(),
            ],
        ));
        operations.push(Operation::new("s", vec![]));
        operations.push(Operation::new("Q", vec![]));

        self.add_operations(page_index, operations)
    }

    /// Write the pages so far specified to the underlying PDF document and
    /// finalize it. The instance ID is paired with the document identifier in
    /// the PDF `ID` tag, as the specification mandates.
    pub fn write_all(&mut self, instance_id: String) -> Result<(), ContextError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        // Construct the general information the PDF document needs in order to
        // be parsed correctly and insert it into the document itself.
        let creation_date = to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH);
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            (
                "CreationDate",
                String(creation_date.clone().into_bytes(), Literal),
            ),
            ("ModDate", String(creation_date.into_bytes(), Literal)),
            (
                "Title",
                String("Informe del Vehiculo".to_string().into_bytes(), Literal),
            ),
            (
                "Producer",
                String("informe".to_string().into_bytes(), Literal),
            ),
            (
                "Identifier",
                String(self.identifier.clone().into_bytes(), Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        // Construct the catalog, required by the PDF specification.
        let pages_id = self.inner_document.new_object_id();
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.into_bytes(), Literal),
            ]),
        );

        // Register the standard fonts once; every page references the same
        // font dictionary.
        let mut fonts_dictionary = lopdf::Dictionary::new();
        for font in BuiltinFont::ALL {
            let font_id = self.inner_document.add_object(Dictionary(
                lopdf::Dictionary::from_iter(vec![
                    ("Type", Name("Font".into())),
                    ("Subtype", Name("Type1".into())),
                    ("BaseFont", Name(font.base_font().into())),
                    ("Encoding", Name("WinAnsiEncoding".into())),
                ]),
            ));
            fonts_dictionary.set(font.resource_name(), Reference(font_id));
        }
        let fonts_dictionary_id = self.inner_document.add_object(Dictionary(fonts_dictionary));

        let mut page_ids = Vec::<lopdf::Object>::new();
        for page in mem::take(&mut self.pages) {
            let content = lopdf::content::Content {
                operations: page.operations,
            };
            let content_bytes = content.encode().map_err(|error| {
                ContextError::with_error(
                    format!("Unable to encode the content of page {}", page.number),
                    &error,
                )
            })?;
            let content_id = self
                .inner_document
                .add_object(lopdf::Stream::new(lopdf::Dictionary::new(), content_bytes));

            let resources = lopdf::Dictionary::from_iter(vec![(
                "Font",
                Reference(fonts_dictionary_id),
            )]);
            let resources_id = self.inner_document.add_object(Dictionary(resources));

            let page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Rotate", Integer(0)),
                (
                    "MediaBox",
                    vec![0.into(), 0.into(), page.width.into(), page.height.into()].into(),
                ),
                ("Parent", Reference(pages_id)),
                ("Resources", Reference(resources_id)),
                ("Contents", Reference(content_id)),
            ]);
            page_ids.push(Reference(self.inner_document.add_object(page_dictionary)));
        }

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", page_ids.into()),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));

        Ok(())
    }

    /// Optimize the PDF document (only superficially).
    pub fn optimize(&mut self) {
        self.inner_document.prune_objects();
        self.inner_document.delete_zero_length_streams();
        self.inner_document.renumber_objects();
        self.inner_document.compress();
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file
    /// or further processed. `write_all` must have been called first.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    /// Finalizes the document and writes it to the given path.
    pub fn save_to_file(&mut self, path: &Path, instance_id: String) -> Result<(), ContextError> {
        self.write_all(instance_id)?;
        self.optimize();
        let bytes = self.save_to_bytes()?;
        std::fs::write(path, bytes).map_err(|error| {
            ContextError::with_error(
                format!("Unable to write the PDF document to {:?}", path),
                &error,
            )
        })
    }

    /// This function is responsible for adding the given operations to the
    /// content stream of the specified page.
    fn add_operations(
        &mut self,
        page_index: usize,
        operations: Vec<Operation>,
    ) -> Result<(), ContextError> {
        let pdf_page = self
            .pages
            .get_mut(page_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the page with index {}",
                page_index
            )))?;
        pdf_page.operations.extend(operations);

        Ok(())
    }
}

/// Converts millimeters to points, the unit required by the PDF specification.
pub(crate) fn millimeters_to_points(millimeters: f32) -> f32 {
    millimeters * 2.834646
}

/// Encodes text for the WinAnsi encoding of the standard fonts. The text is
/// NFC-normalized first so that combining sequences collapse into the single
/// codepoints the encoding knows about. Characters outside of the Latin-1
/// range are replaced with a question mark.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc()
        .map(|character| {
            let codepoint = character as u32;
            match codepoint {
                0x20..=0x7E | 0xA0..=0xFF => codepoint as u8,
                _ => {
                    log::warn!(
                        "Unable to encode the character {:?} for the built-in fonts",
                        character
                    );
                    b'?'
                }
            }
        })
        .collect()
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fragments_survive_the_win_ansi_round_trip() {
        let mut document = PdfDocument::new("test-document".into());
        let page = document.add_page(210.0, 297.0);
        document
            .write_text(page, "Revision al dia", BuiltinFont::Helvetica, 11.0, [0.0; 3], [15.0, 250.0])
            .unwrap();
        assert_eq!(document.pages()[page].text_fragments(), vec!["Revision al dia"]);
    }

    #[test]
    fn characters_outside_latin_1_are_substituted() {
        assert_eq!(encode_win_ansi("año"), "año".chars().map(|c| c as u8).collect::<Vec<u8>>());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn writing_to_a_missing_page_is_an_error() {
        let mut document = PdfDocument::new("test-document".into());
        let result = document.write_text(3, "x", BuiltinFont::Helvetica, 11.0, [0.0; 3], [0.0, 0.0]);
        assert!(result.is_err());
    }

    #[test]
    fn a_finalized_document_loads_back_with_its_pages() {
        let mut document = PdfDocument::new("test-document".into());
        let first = document.add_page(210.0, 297.0);
        document
            .fill_rectangle(first, [0.0, 267.0], [210.0, 30.0], [0.11, 0.3, 0.85])
            .unwrap();
        document.add_page(210.0, 297.0);
        document.write_all("instance-0000000000000000000000".into()).unwrap();
        document.optimize();
        let bytes = document.save_to_bytes().unwrap();

        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
    }
}
