use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Receipt,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Receipt => "receipt",
        }
    }
}

/// A fully rendered HTML document
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    /// order number for invoices, receipt number for receipts
    pub reference: String,
    pub html: String,
}

impl RenderedDocument {
    pub fn file_name(&self) -> String {
        let safe: String = self
            .reference
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}-{}.html", self.kind.as_str(), safe)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentQuery {
    /// `1` forces an attachment download
    pub download: Option<u8>,
}

impl DocumentQuery {
    pub fn wants_download(&self) -> bool {
        self.download == Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_sanitized() {
        let doc = RenderedDocument {
            kind: DocumentKind::Invoice,
            reference: "ORD/2024 07\"x".to_string(),
            html: String::new(),
        };
        assert_eq!(doc.file_name(), "invoice-ORD_2024_07_x.html");
    }

    #[test]
    fn test_wants_download() {
        assert!(DocumentQuery { download: Some(1) }.wants_download());
        assert!(!DocumentQuery { download: Some(0) }.wants_download());
        assert!(!DocumentQuery::default().wants_download());
    }
}
