use crate::constants::SHOPPING_CART_FILE_EXT;
use crate::schema::ShoppingListItem;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;
const LEADING: f32 = 18.0;
const LINES_PER_PAGE: usize = 36;

/// Downloadable document for an aggregated shopping list.
///
/// The renderer emits the list as-is; the only contract with the aggregator
/// is the shape of `ShoppingListItem`. Rendering goes straight to an
/// in-memory byte buffer, no platform dependencies.
#[derive(Debug, Clone)]
pub struct ShoppingListDocument {
    pub username: String,
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingListDocument {
    pub fn new(username: impl Into<String>, items: Vec<ShoppingListItem>) -> Self {
        Self {
            username: username.into(),
            items,
        }
    }

    pub fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    pub fn filename(&self) -> String {
        format!("{}_shopping_cart.{SHOPPING_CART_FILE_EXT}", self.username)
    }

    /// Serializes the document as a complete PDF byte stream.
    pub fn render(&self) -> Vec<u8> {
        let mut builder = PdfBuilder::new();

        let pages: Vec<&[ShoppingListItem]> = if self.items.is_empty() {
            vec![&[]]
        } else {
            self.items.chunks(LINES_PER_PAGE).collect()
        };

        let font_id = 3;
        let first_page_id = font_id + 1;
        let page_ids: Vec<u32> = (0..pages.len())
            .map(|i| first_page_id + (i as u32) * 2)
            .collect();

        let kids = page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");

        builder.object(1, "<< /Type /Catalog /Pages 2 0 R >>".into());
        builder.object(
            2,
            format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        );
        builder.object(
            font_id,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".into(),
        );

        for (i, chunk) in pages.iter().enumerate() {
            let page_id = page_ids[i];
            let content_id = page_id + 1;

            builder.object(
                page_id,
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                     /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {content_id} 0 R >>"
                ),
            );
            builder.stream_object(content_id, self.page_content(chunk, i == 0));
        }

        builder.finish()
    }

    fn page_content(&self, items: &[ShoppingListItem], with_title: bool) -> Vec<u8> {
        let mut ops = String::from("BT\n");
        let mut y = PAGE_HEIGHT - MARGIN;

        if with_title {
            ops.push_str(&format!(
                "/F1 {TITLE_SIZE} Tf\n1 0 0 1 {MARGIN} {y} Tm\n({}) Tj\n",
                escape_text("Shopping list")
            ));
            y -= LEADING * 2.0;
        }

        ops.push_str(&format!("/F1 {BODY_SIZE} Tf\n"));
        if with_title && items.is_empty() {
            ops.push_str(&format!(
                "1 0 0 1 {MARGIN} {y} Tm\n({}) Tj\n",
                escape_text("The shopping cart is empty.")
            ));
        }

        for item in items {
            let text = format!(
                "{} - {} {}",
                item.name, item.amount, item.measurement_unit
            );
            ops.push_str(&format!(
                "1 0 0 1 {MARGIN} {y} Tm\n({}) Tj\n",
                escape_text(&text)
            ));
            y -= LEADING;
        }

        ops.push_str("ET\n");
        ops.into_bytes()
    }
}

/// Escapes the characters that delimit PDF literal strings.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Accumulates numbered PDF objects and serializes them with a cross
/// reference table. Object ids must be added in increasing order starting
/// at 1.
struct PdfBuilder {
    buffer: Vec<u8>,
    offsets: Vec<(u32, usize)>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            buffer: b"%PDF-1.4\n".to_vec(),
            offsets: vec![],
        }
    }

    fn object(&mut self, id: u32, body: String) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream_object(&mut self, id: u32, stream: Vec<u8>) {
        self.offsets.push((id, self.buffer.len()));
        self.buffer.extend_from_slice(
            format!("{id} 0 obj\n<< /Length {} >>\nstream\n", stream.len()).as_bytes(),
        );
        self.buffer.extend_from_slice(&stream);
        self.buffer.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);

        let xref_offset = self.buffer.len();
        let count = self.offsets.len() + 1;

        self.buffer
            .extend_from_slice(format!("xref\n0 {count}\n0000000000 65535 f \n").as_bytes());
        for (_, offset) in &self.offsets {
            self.buffer
                .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.buffer.extend_from_slice(
            format!(
                "trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
            )
            .as_bytes(),
        );

        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, amount: i64, unit: &str) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            amount,
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn filename_follows_convention() {
        let doc = ShoppingListDocument::new("olga", vec![]);
        assert_eq!(doc.filename(), "olga_shopping_cart.pdf");
        assert_eq!(doc.content_type(), "application/pdf");
    }

    #[test]
    fn renders_a_wellformed_pdf() {
        let doc = ShoppingListDocument::new(
            "olga",
            vec![item("Salt", 15, "g"), item("Sugar", 2, "g")],
        );
        let bytes = doc.render();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(Salt - 15 g) Tj"));
        assert!(text.contains("(Sugar - 2 g) Tj"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn empty_list_still_renders_one_page() {
        let bytes = ShoppingListDocument::new("olga", vec![]).render();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/Count 1"));
        assert!(text.contains("The shopping cart is empty."));
    }

    #[test]
    fn long_lists_break_into_pages() {
        let items = (0..80).map(|i| item("Spice", i, "g")).collect();
        let bytes = ShoppingListDocument::new("olga", items).render();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/Count 3"));
    }

    #[test]
    fn escapes_string_delimiters() {
        let bytes =
            ShoppingListDocument::new("olga", vec![item("Cake (vegan)", 1, "pc")]).render();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("(Cake \\(vegan\\) - 1 pc) Tj"));
    }
}
