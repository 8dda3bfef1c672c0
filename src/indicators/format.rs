use serde::{Deserialize, Serialize};

/// Display format of an indicator reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// 4.26 -> "4%"
    Pct0,
    /// 4.26 -> "4.3%"
    Pct1,
    Pct2,
    Plain0,
    #[default]
    Plain1,
    Plain2,
}

impl FormatKind {
    /// Renders `value`, or `--` when there is no finite reading.
    pub fn format(&self, value: Option<f64>) -> String {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            return "--".to_string();
        };
        match self {
            FormatKind::Pct0 => format!("{:.0}%", v),
            FormatKind::Pct1 => format!("{:.1}%", v),
            FormatKind::Pct2 => format!("{:.2}%", v),
            FormatKind::Plain0 => format!("{:.0}", v),
            FormatKind::Plain1 => format!("{:.1}", v),
            FormatKind::Plain2 => format!("{:.2}", v),
        }
    }
}
