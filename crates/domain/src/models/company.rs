//! Company profile used for rendering and email templating.

use serde::{Deserialize, Serialize};

/// Read-only bag of company data, loaded from configuration.
///
/// The subject and body templates use the literal placeholder set handled by
/// [`crate::services::templating`]; anything else in them passes through
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub iban: String,
    #[serde(default)]
    pub bic: String,
    #[serde(default = "default_subject_template")]
    pub email_subject_template: String,
    #[serde(default = "default_body_template")]
    pub email_body_template: String,
    #[serde(default = "default_vat")]
    pub vat_default: f64,
    #[serde(default)]
    pub withholding_default: f64,
}

fn default_subject_template() -> String {
    "Factura {numero} - {empresa}".to_string()
}

fn default_body_template() -> String {
    "Estimado/a {cliente},\n\nAdjuntamos la factura {numero} por un importe de {total}.\n\nUn saludo,\n{empresa}".to_string()
}

fn default_vat() -> f64 {
    21.0
}
