// src/export/pdf.rs

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 50.0;
const ROW_H: f32 = 20.0;

const BODY_SIZE: f32 = 10.0;
const HEADER_SIZE: f32 = 11.0;
const TITLE_SIZE: f32 = 14.0;

/// A4 report: title on every page, a key/value block on the first page,
/// then a paginated table with a shaded header row.
pub(crate) struct PdfReport {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    font_id: Ref,
    next_id: i32,
    page_refs: Vec<Ref>,
}

impl PdfReport {
    pub fn new() -> Self {
        let mut pdf = Pdf::new();

        // ID gestiti a mano
        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);

        pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            font_id,
            next_id: 4,
            page_refs: Vec::new(),
        }
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    /// Registers a page and returns the ref its content stream must use.
    fn open_page(&mut self) -> Ref {
        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();
        self.page_refs.push(page_id);

        let mut page = self.pdf.page(page_id);
        page.parent(self.pages_id)
            .media_box(Rect::new(0.0, 0.0, PAGE_W, PAGE_H))
            .contents(content_id);
        page.resources().fonts().pair(Name(b"F1"), self.font_id);

        content_id
    }

    /// Renders the whole document and returns the PDF bytes.
    pub fn render(
        mut self,
        title: &str,
        summary: &[(String, String)],
        headers: &[&str],
        rows: &[Vec<String>],
    ) -> Vec<u8> {
        let widths = column_widths(headers, rows);
        let header_row: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

        let mut remaining = rows;
        let mut page_no = 1;

        loop {
            let content_id = self.open_page();
            let mut content = Content::new();
            page_frame(&mut content, title, page_no);

            let mut y = PAGE_H - MARGIN - 30.0;

            if page_no == 1 {
                for (key, value) in summary {
                    draw_text(&mut content, MARGIN, y + 5.0, BODY_SIZE, &format!("{key}: {value}"));
                    y -= ROW_H * 0.8;
                }
                y -= ROW_H * 0.5;
            }

            fill_band(&mut content, y, &widths, (0.85, 0.87, 0.90));
            draw_row(&mut content, y, &widths, &header_row, HEADER_SIZE);
            y -= ROW_H;

            let mut consumed = 0;
            for (i, row) in remaining.iter().enumerate() {
                if y - ROW_H < MARGIN {
                    break;
                }
                if i % 2 == 0 {
                    fill_band(&mut content, y, &widths, (0.96, 0.96, 0.96));
                }
                draw_row(&mut content, y, &widths, row, BODY_SIZE);
                y -= ROW_H;
                consumed += 1;
            }

            self.pdf.stream(content_id, &content.finish());
            remaining = &remaining[consumed..];
            page_no += 1;

            // una pagina va sempre emessa, anche senza righe
            if remaining.is_empty() || consumed == 0 {
                break;
            }
        }

        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        let count = self.page_refs.len() as i32;
        self.pdf
            .pages(self.pages_id)
            .count(count)
            .kids(self.page_refs.iter().copied());

        self.pdf.finish()
    }
}

/// Header widths grow with the widest cell, then shrink to fit the page.
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<f32> {
    let mut widths: Vec<f32> = headers.iter().map(|h| h.len() as f32 * 6.5).collect();

    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = w.max(cell.chars().count() as f32 * 6.2);
        }
    }

    let total: f32 = widths.iter().sum();
    let max = PAGE_W - 2.0 * MARGIN;
    if total > max {
        let scale = max / total;
        widths.iter_mut().for_each(|w| *w *= scale);
    }

    widths
}

fn page_frame(content: &mut Content, title: &str, page_no: usize) {
    draw_text(content, MARGIN, PAGE_H - MARGIN + 15.0, TITLE_SIZE, title);
    draw_text(
        content,
        PAGE_W - MARGIN - 60.0,
        MARGIN - 35.0,
        BODY_SIZE,
        &format!("Page {page_no}"),
    );
}

fn fill_band(content: &mut Content, y: f32, widths: &[f32], (r, g, b): (f32, f32, f32)) {
    content.save_state();
    content.set_fill_rgb(r, g, b);
    content.rect(MARGIN, y, widths.iter().sum(), ROW_H);
    content.fill_nonzero();
    content.restore_state();
}

fn draw_row(content: &mut Content, y: f32, widths: &[f32], cells: &[String], size: f32) {
    let mut x = MARGIN;
    for (w, text) in widths.iter().zip(cells) {
        draw_text(content, x + 4.0, y + 5.0, size, text);

        content.save_state();
        content.set_stroke_rgb(0.65, 0.65, 0.65);
        content.rect(x, y, *w, ROW_H);
        content.stroke();
        content.restore_state();

        x += w;
    }
}

fn draw_text(content: &mut Content, x: f32, y: f32, size: f32, text: &str) {
    let encoded = latin1(text);
    content.begin_text();
    content.set_font(Name(b"F1"), size);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(&encoded));
    content.end_text();
}

/// Helvetica (standard encoding) only covers Latin-1; anything else becomes '?'.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '→' => b'-',
            c if (c as u32) < 0x100 => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
