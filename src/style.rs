use ratatui::style::{Color, Modifier, Style as RatStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EnhanceError, Result};

/// Color that can be serialized/deserialized
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeColor {
    /// Named color: "red", "blue", "cyan", etc.
    Named(NamedColor),
    /// RGB color: [255, 128, 0]
    Rgb([u8; 3]),
    /// 256-color index: 42
    Indexed(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
    DarkGray,
    LightCyan,
    LightYellow,
    White,
    Reset,
}

impl From<ThemeColor> for Color {
    fn from(tc: ThemeColor) -> Color {
        match tc {
            ThemeColor::Named(n) => match n {
                NamedColor::Black => Color::Black,
                NamedColor::Red => Color::Red,
                NamedColor::Green => Color::Green,
                NamedColor::Yellow => Color::Yellow,
                NamedColor::Blue => Color::Blue,
                NamedColor::Magenta => Color::Magenta,
                NamedColor::Cyan => Color::Cyan,
                NamedColor::Gray => Color::Gray,
                NamedColor::DarkGray => Color::DarkGray,
                NamedColor::LightCyan => Color::LightCyan,
                NamedColor::LightYellow => Color::LightYellow,
                NamedColor::White => Color::White,
                NamedColor::Reset => Color::Reset,
            },
            ThemeColor::Rgb([r, g, b]) => Color::Rgb(r, g, b),
            ThemeColor::Indexed(i) => Color::Indexed(i),
        }
    }
}

/// Style definition for a single element
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<ThemeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<ThemeColor>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub dim: bool,
}

impl ElementStyle {
    pub fn fg(color: ThemeColor) -> Self {
        Self { fg: Some(color), ..Default::default() }
    }

    pub fn with_bg(mut self, color: ThemeColor) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn to_ratatui(&self) -> RatStyle {
        let mut style = RatStyle::default();
        if let Some(fg) = self.fg {
            style = style.fg(fg.into());
        }
        if let Some(bg) = self.bg {
            style = style.bg(bg.into());
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.underline {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if self.dim {
            style = style.add_modifier(Modifier::DIM);
        }
        style
    }
}

/// Complete theme configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,

    // Header cells, pinned at the top of the table
    pub header: ElementStyle,
    pub header_sorted: ElementStyle,
    pub header_selected: ElementStyle,
    /// Header section rows other than the pinned one
    pub header_extra_row: ElementStyle,

    // Body
    pub cell: ElementStyle,
    pub footer: ElementStyle,

    // Filter input above the table
    pub filter_label: ElementStyle,
    pub filter_input: ElementStyle,
    pub filter_placeholder: ElementStyle,

    // Status bar
    pub status_bar: ElementStyle,
    pub status_table: ElementStyle,

    // Messages
    pub message_info: ElementStyle,
    pub message_error: ElementStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self::teal()
    }
}

impl Theme {
    /// Teal header with white text (default)
    pub fn teal() -> Self {
        use NamedColor::*;
        let teal = ThemeColor::Rgb([0x14, 0xb8, 0xa6]);
        let white = ThemeColor::Named(White);
        Self {
            name: "teal".to_string(),
            header: ElementStyle::fg(white).with_bg(teal).with_bold(),
            header_sorted: ElementStyle::fg(ThemeColor::Named(Black)).with_bg(teal).with_bold(),
            header_selected: ElementStyle::fg(white).with_bg(teal).with_bold().with_underline(),
            cell: ElementStyle::default(),
            header_extra_row: ElementStyle::fg(white).with_bg(teal).with_bold(),
            footer: ElementStyle::default().with_italic(),
            filter_label: ElementStyle::fg(teal).with_bold(),
            filter_input: ElementStyle::default(),
            filter_placeholder: ElementStyle::fg(ThemeColor::Named(Gray)).with_dim(),
            status_bar: ElementStyle::fg(ThemeColor::Named(Black)).with_bg(ThemeColor::Named(Gray)),
            status_table: ElementStyle::fg(white).with_bg(teal).with_bold(),
            message_info: ElementStyle::default(),
            message_error: ElementStyle::fg(ThemeColor::Named(Red)).with_bold(),
        }
    }

    /// Dark theme
    pub fn dark() -> Self {
        use NamedColor::*;
        Self {
            name: "dark".to_string(),
            header: ElementStyle::fg(ThemeColor::Named(LightCyan)).with_bold(),
            header_sorted: ElementStyle::fg(ThemeColor::Named(LightYellow)).with_bold(),
            header_selected: ElementStyle::fg(ThemeColor::Named(Black))
                .with_bg(ThemeColor::Named(LightCyan))
                .with_bold(),
            cell: ElementStyle::fg(ThemeColor::Named(White)),
            header_extra_row: ElementStyle::fg(ThemeColor::Named(LightCyan)).with_bold(),
            footer: ElementStyle::fg(ThemeColor::Named(Gray)).with_italic(),
            filter_label: ElementStyle::fg(ThemeColor::Named(LightCyan)).with_bold(),
            filter_input: ElementStyle::fg(ThemeColor::Named(White)),
            filter_placeholder: ElementStyle::fg(ThemeColor::Named(DarkGray)),
            status_bar: ElementStyle::fg(ThemeColor::Named(White))
                .with_bg(ThemeColor::Named(DarkGray)),
            status_table: ElementStyle::fg(ThemeColor::Named(Black))
                .with_bg(ThemeColor::Named(LightCyan))
                .with_bold(),
            message_info: ElementStyle::fg(ThemeColor::Named(White)),
            message_error: ElementStyle::fg(ThemeColor::Named(Red)).with_bold(),
        }
    }

    /// Light theme
    pub fn light() -> Self {
        use NamedColor::*;
        Self {
            name: "light".to_string(),
            header: ElementStyle::fg(ThemeColor::Named(Blue)).with_bold(),
            header_sorted: ElementStyle::fg(ThemeColor::Named(Magenta)).with_bold(),
            header_selected: ElementStyle::fg(ThemeColor::Named(White))
                .with_bg(ThemeColor::Named(Blue))
                .with_bold(),
            cell: ElementStyle::fg(ThemeColor::Named(Black)),
            header_extra_row: ElementStyle::fg(ThemeColor::Named(Blue)).with_bold(),
            footer: ElementStyle::fg(ThemeColor::Named(DarkGray)).with_italic(),
            filter_label: ElementStyle::fg(ThemeColor::Named(Blue)).with_bold(),
            filter_input: ElementStyle::fg(ThemeColor::Named(Black)),
            filter_placeholder: ElementStyle::fg(ThemeColor::Named(Gray)),
            status_bar: ElementStyle::fg(ThemeColor::Named(Black))
                .with_bg(ThemeColor::Named(Gray)),
            status_table: ElementStyle::fg(ThemeColor::Named(White))
                .with_bg(ThemeColor::Named(Blue))
                .with_bold(),
            message_info: ElementStyle::fg(ThemeColor::Named(Black)),
            message_error: ElementStyle::fg(ThemeColor::Named(Red)).with_bold(),
        }
    }

    /// Load theme from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EnhanceError::Theme(format!("failed to read theme file: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| EnhanceError::Theme(format!("failed to parse theme file: {}", e)))
    }

    /// Get theme by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "teal" => Some(Self::teal()),
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    /// List available built-in themes
    pub fn builtin_names() -> &'static [&'static str] {
        &["teal", "dark", "light"]
    }
}

/// Runtime style manager
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub theme: Theme,
}

impl Style {
    pub fn with_theme(theme: Theme) -> Self {
        Self { theme }
    }

    // Convenience accessors that return ratatui styles
    pub fn header(&self) -> RatStyle {
        self.theme.header.to_ratatui()
    }

    pub fn header_sorted(&self) -> RatStyle {
        self.theme.header_sorted.to_ratatui()
    }

    pub fn header_selected(&self) -> RatStyle {
        self.theme.header_selected.to_ratatui()
    }

    pub fn cell(&self) -> RatStyle {
        self.theme.cell.to_ratatui()
    }

    pub fn header_extra_row(&self) -> RatStyle {
        self.theme.header_extra_row.to_ratatui()
    }

    pub fn footer(&self) -> RatStyle {
        self.theme.footer.to_ratatui()
    }

    pub fn filter_label(&self) -> RatStyle {
        self.theme.filter_label.to_ratatui()
    }

    pub fn filter_input(&self) -> RatStyle {
        self.theme.filter_input.to_ratatui()
    }

    pub fn filter_placeholder(&self) -> RatStyle {
        self.theme.filter_placeholder.to_ratatui()
    }

    pub fn status_bar(&self) -> RatStyle {
        self.theme.status_bar.to_ratatui()
    }

    pub fn status_table(&self) -> RatStyle {
        self.theme.status_table.to_ratatui()
    }

    pub fn message_info(&self) -> RatStyle {
        self.theme.message_info.to_ratatui()
    }

    pub fn message_error(&self) -> RatStyle {
        self.theme.message_error.to_ratatui()
    }
}
