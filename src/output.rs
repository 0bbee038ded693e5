//! Human and JSON rendering for command results. Everything here goes to stdout.

use serde::Serialize;

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Pretty JSON of `value` in JSON mode, `human` otherwise.
    pub fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        human: impl FnOnce(),
    ) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

/// `name  description` rows with the names padded to one column.
pub fn print_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str)>) {
    let rows: Vec<_> = rows.into_iter().collect();
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, description) in rows {
        if description.is_empty() {
            println!("  {name}");
        } else {
            println!("  {name:<width$}  {description}");
        }
    }
}
