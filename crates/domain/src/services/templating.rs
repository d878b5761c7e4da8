//! Email subject/body placeholder substitution.
//!
//! Deliberately not a templating engine: a literal find-and-replace over a
//! small fixed placeholder set. Unknown placeholders pass through verbatim,
//! which existing company templates depend on.

/// Values substituted into an email template.
#[derive(Debug, Clone)]
pub struct PlaceholderValues<'a> {
    /// `{empresa}` - company name.
    pub company: &'a str,
    /// `{cliente}` - client name.
    pub client: &'a str,
    /// `{numero}` - invoice number.
    pub number: &'a str,
    /// `{total}` - formatted invoice total.
    pub total: &'a str,
    /// `{fecha}` - issue date.
    pub date: &'a str,
}

/// Substitutes the fixed placeholder set into `template`.
pub fn render_template(template: &str, values: &PlaceholderValues<'_>) -> String {
    template
        .replace("{empresa}", values.company)
        .replace("{cliente}", values.client)
        .replace("{numero}", values.number)
        .replace("{total}", values.total)
        .replace("{fecha}", values.date)
}
