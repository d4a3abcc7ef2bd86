use ratatui::style::Color;

pub const THEME_NAMES: [&str; 3] = ["default", "dark", "light"];

#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub step_on: Color,
    pub step_playing: Color,
    pub cursor: Color,
    pub warn: Color,
}

// unknown names (hand-edited prefs, say) fall back to the default palette
pub fn palette(name: &str) -> Palette {
    match name {
        "dark" => Palette {
            text: Color::Gray,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            step_on: Color::Blue,
            step_playing: Color::LightCyan,
            cursor: Color::White,
            warn: Color::Yellow,
        },
        "light" => Palette {
            text: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
            step_on: Color::Red,
            step_playing: Color::LightRed,
            cursor: Color::Black,
            warn: Color::Red,
        },
        _ => Palette {
            text: Color::White,
            dim: Color::DarkGray,
            accent: Color::Magenta,
            step_on: Color::Magenta,
            step_playing: Color::LightGreen,
            cursor: Color::Yellow,
            warn: Color::Yellow,
        },
    }
}

pub fn next_theme_name(current: &str) -> &'static str {
    let next = THEME_NAMES
        .iter()
        .position(|&name| name == current)
        .map_or(0, |i| (i + 1) % THEME_NAMES.len());
    THEME_NAMES[next]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_cycle() {
        assert_eq!(next_theme_name("default"), "dark");
        assert_eq!(next_theme_name("dark"), "light");
        assert_eq!(next_theme_name("light"), "default");
        assert_eq!(next_theme_name("neon"), "default");
    }
}
