// src/services/document_service.rs

use std::path::{Path, PathBuf};

use genpdf::{elements, style, Alignment, Element};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::reports::{AssetReportRow, ExportFormat},
};

const FONT_FAMILY: &str = "Roboto";

const CSV_HEADER: [&str; 9] = [
    "Código",
    "Nombre",
    "Departamento",
    "Categoría",
    "Ubicación",
    "Estado",
    "Proveedor",
    "Fecha de adquisición",
    "Valor actual",
];

/// Arquivo pronto para download.
#[derive(Debug)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self { fonts_dir: fonts_dir.into() }
    }

    pub async fn render_assets(
        &self,
        title: String,
        file_stem: &str,
        rows: Vec<AssetReportRow>,
        format: ExportFormat,
    ) -> Result<RenderedReport, AppError> {
        let bytes = match format {
            ExportFormat::Csv => assets_csv(&rows).into_bytes(),
            ExportFormat::Pdf => {
                // genpdf é síncrono e pesado: roda fora do runtime
                let fonts_dir = self.fonts_dir.clone();
                tokio::task::spawn_blocking(move || assets_pdf(&fonts_dir, &title, &rows))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de PDF: {}", e))??
            }
        };

        Ok(RenderedReport {
            bytes,
            content_type: format.content_type(),
            filename: format!("{}.{}", file_stem, format.extension()),
        })
    }
}

// ---
// CSV
// ---

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV com BOM (para o Excel reconhecer UTF-8) e uma linha por ativo.
pub fn assets_csv(rows: &[AssetReportRow]) -> String {
    let mut out = String::from("\u{FEFF}");
    out.push_str(&CSV_HEADER.join(","));
    out.push_str("\r\n");

    for row in rows {
        let fields = [
            row.internal_code.as_str(),
            row.name.as_str(),
            row.department_name.as_deref().unwrap_or(""),
            row.category_name.as_deref().unwrap_or(""),
            row.location_name.as_deref().unwrap_or(""),
            row.state_name.as_deref().unwrap_or(""),
            row.supplier_name.as_deref().unwrap_or(""),
        ];
        let mut line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        line.push(row.acquired_on.format("%Y-%m-%d").to_string());
        line.push(format!("{:.2}", row.current_value));
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

// ---
// PDF
// ---

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao gerar PDF: {}", e))
}

fn assets_pdf(fonts_dir: &Path, title: &str, rows: &[AssetReportRow]) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None).map_err(|e| {
        AppError::InternalServerError(anyhow::anyhow!(
            "Fonte {} não encontrada em {}: {}",
            FONT_FAMILY,
            fonts_dir.display(),
            e
        ))
    })?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(elements::Paragraph::new(title).styled(style::Style::new().bold().with_font_size(16)));
    doc.push(elements::Paragraph::new(format!(
        "Generado: {}",
        chrono::Utc::now().format("%d/%m/%Y %H:%M")
    )));
    doc.push(elements::Break::new(1.5));

    // Código (2), Nome (4), Departamento (3), Local (3), Estado (2), Data (2), Valor (2)
    let mut table = elements::TableLayout::new(vec![2, 4, 3, 3, 2, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold().with_font_size(9);
    let mut header = table.row();
    for label in ["Código", "Nombre", "Departamento", "Ubicación", "Estado", "Adquisición", "Valor"] {
        header = header.element(elements::Paragraph::new(label).styled(bold));
    }
    header.push().map_err(pdf_error)?;

    let cell = style::Style::new().with_font_size(8);
    let mut total = Decimal::ZERO;
    for row in rows {
        total += row.current_value;
        let mut value = elements::Paragraph::new(format!("{:.2}", row.current_value));
        value.set_alignment(Alignment::Right);

        table
            .row()
            .element(elements::Paragraph::new(row.internal_code.as_str()).styled(cell))
            .element(elements::Paragraph::new(row.name.as_str()).styled(cell))
            .element(elements::Paragraph::new(row.department_name.as_deref().unwrap_or("-")).styled(cell))
            .element(elements::Paragraph::new(row.location_name.as_deref().unwrap_or("-")).styled(cell))
            .element(elements::Paragraph::new(row.state_name.as_deref().unwrap_or("-")).styled(cell))
            .element(elements::Paragraph::new(row.acquired_on.format("%d/%m/%Y").to_string()).styled(cell))
            .element(value.styled(cell))
            .push()
            .map_err(pdf_error)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(1));

    let mut summary = elements::Paragraph::new(format!("Activos: {}   Valor total: {:.2}", rows.len(), total));
    summary.set_alignment(Alignment::Right);
    doc.push(summary.styled(style::Style::new().bold()));

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn row(name: &str, value: i64) -> AssetReportRow {
        AssetReportRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            internal_code: "AF-001".into(),
            acquired_on: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            current_value: Decimal::new(value, 2),
            department_name: Some("TI".into()),
            category_name: None,
            location_name: Some("Central".into()),
            state_name: Some("Operativo".into()),
            supplier_name: None,
        }
    }

    #[test]
    fn csv_has_bom_header_and_one_line_per_row() {
        let csv = assets_csv(&[row("Laptop", 150050)]);
        assert!(csv.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = csv.trim_end().split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "AF-001,Laptop,TI,,Central,Operativo,,2024-05-02,1500.50");
    }

    #[test]
    fn csv_quotes_fields_with_separators() {
        let csv = assets_csv(&[row("Monitor 24\", curvo", 100)]);
        assert!(csv.contains("\"Monitor 24\"\", curvo\""));
    }
}
