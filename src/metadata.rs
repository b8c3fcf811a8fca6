//! # Widget Metadata
//!
//! Static registries describing the source and target vocabularies: which
//! SquareLine object types have an ESPHome LVGL counterpart, and which
//! SquareLine events map onto ESPHome triggers.

/// SquareLine object types with an ESPHome widget keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Label,
    Button,
    Image,
    Panel,
    Container,
    TextArea,
    TabView,
    TabPage,
    Checkbox,
    Dropdown,
    Keyboard,
    Roller,
    Screen,
    Slider,
    Switch,
    Spinbox,
    Bar,
    Arc,
    Spinner,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 19] = [
        WidgetKind::Label,
        WidgetKind::Button,
        WidgetKind::Image,
        WidgetKind::Panel,
        WidgetKind::Container,
        WidgetKind::TextArea,
        WidgetKind::TabView,
        WidgetKind::TabPage,
        WidgetKind::Checkbox,
        WidgetKind::Dropdown,
        WidgetKind::Keyboard,
        WidgetKind::Roller,
        WidgetKind::Screen,
        WidgetKind::Slider,
        WidgetKind::Switch,
        WidgetKind::Spinbox,
        WidgetKind::Bar,
        WidgetKind::Arc,
        WidgetKind::Spinner,
    ];

    /// Resolve a `saved_objtypeKey`
    pub fn from_source(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.source_name() == kind)
    }

    pub fn source_name(self) -> &'static str {
        match self {
            WidgetKind::Label => "LABEL",
            WidgetKind::Button => "BUTTON",
            WidgetKind::Image => "IMAGE",
            WidgetKind::Panel => "PANEL",
            WidgetKind::Container => "CONTAINER",
            WidgetKind::TextArea => "TEXTAREA",
            WidgetKind::TabView => "TABVIEW",
            WidgetKind::TabPage => "TABPAGE",
            WidgetKind::Checkbox => "CHECKBOX",
            WidgetKind::Dropdown => "DROPDOWN",
            WidgetKind::Keyboard => "KEYBOARD",
            WidgetKind::Roller => "ROLLER",
            WidgetKind::Screen => "SCREEN",
            WidgetKind::Slider => "SLIDER",
            WidgetKind::Switch => "SWITCH",
            WidgetKind::Spinbox => "SPINBOX",
            WidgetKind::Bar => "BAR",
            WidgetKind::Arc => "ARC",
            WidgetKind::Spinner => "SPINNER",
        }
    }

    /// ESPHome LVGL widget keyword
    pub fn keyword(self) -> &'static str {
        match self {
            WidgetKind::Label => "label",
            WidgetKind::Button => "button",
            WidgetKind::Image => "image",
            // Panels and containers are plain objects in LVGL
            WidgetKind::Panel | WidgetKind::Container => "obj",
            WidgetKind::TextArea => "textarea",
            WidgetKind::TabView => "tabview",
            WidgetKind::TabPage => "tab",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Dropdown => "dropdown",
            WidgetKind::Keyboard => "keyboard",
            WidgetKind::Roller => "roller",
            WidgetKind::Screen => "screen",
            WidgetKind::Slider => "slider",
            WidgetKind::Switch => "switch",
            WidgetKind::Spinbox => "spinbox",
            WidgetKind::Bar => "bar",
            WidgetKind::Arc => "arc",
            WidgetKind::Spinner => "spinner",
        }
    }
}

pub const SCREEN_KIND: &str = "SCREEN";
pub const TAB_KEYWORD: &str = "tab";
pub const TABVIEW_KEYWORD: &str = "tabview";
pub const LABEL_KEYWORD: &str = "label";
pub const TEXTAREA_KEYWORD: &str = "textarea";
pub const ARC_KEYWORD: &str = "arc";

/// SquareLine event name → ESPHome trigger suffix (`on_<suffix>`)
pub const EVENT_MAP: [(&str, &str); 14] = [
    ("VALUE_CHANGED", "change"),
    ("CHECKED", "value"),
    ("PRESSED", "press"),
    ("LONG_PRESSED", "long_press"),
    ("LONG_PRESSED_REPEAT", "long_press_repeat"),
    ("SHORT_CLICKED", "short_click"),
    ("CLICKED", "click"),
    ("RELEASED", "release"),
    ("FOCUSED", "focus"),
    ("DEFOCUSED", "defocus"),
    ("GESTURE_LEFT", "swipe_left"),
    ("GESTURE_RIGHT", "swipe_right"),
    ("GESTURE_DOWN", "swipe_down"),
    ("GESTURE_UP", "swipe_up"),
];

pub fn target_event(source_event: &str) -> Option<&'static str> {
    EVENT_MAP
        .iter()
        .find(|(name, _)| *name == source_event)
        .map(|(_, target)| *target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_round_trips_through_source_name() {
        for kind in WidgetKind::ALL {
            assert_eq!(WidgetKind::from_source(kind.source_name()), Some(kind));
        }
        assert_eq!(WidgetKind::from_source("CHART"), None);
    }

    #[test]
    fn test_panel_and_container_map_to_obj() {
        assert_eq!(WidgetKind::Panel.keyword(), "obj");
        assert_eq!(WidgetKind::Container.keyword(), "obj");
        assert_eq!(WidgetKind::TabPage.keyword(), TAB_KEYWORD);
    }

    #[test]
    fn test_event_table() {
        assert_eq!(target_event("VALUE_CHANGED"), Some("change"));
        assert_eq!(target_event("GESTURE_LEFT"), Some("swipe_left"));
        assert_eq!(target_event("SCREEN_LOADED"), None);
    }
}
