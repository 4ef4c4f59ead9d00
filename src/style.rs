use iced::{container, Color};

const BACKGROUND: Color = Color {
    r: 0.05,
    g: 0.05,
    b: 0.07,
    a: 1.0,
};

pub struct Container;

impl container::StyleSheet for Container {
    fn style(&self) -> container::Style {
        container::Style {
            background: Some(BACKGROUND.into()),
            text_color: Some(Color::WHITE),
            ..container::Style::default()
        }
    }
}
