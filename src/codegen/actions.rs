//! # Event Actions
//!
//! Translates SquareLine event handlers into ESPHome automations.
//!
//! An `_event/EventHandler` record names the event and holds one
//! `_event/action` record per step. Each action carries a verb (`CALL
//! FUNCTION`, `MODIFY FLAG`, ...) and its parameters as child records tagged
//! `<VERB>/<Field>`. Targets are guids and resolve through the identity
//! index. A step that is incomplete or points at an unknown widget is
//! dropped; it never fails the conversion.

use crate::document::{Mapping, Value};
use crate::identity::IdentityIndex;
use crate::mapping;
use crate::metadata::{target_event, LABEL_KEYWORD, TABVIEW_KEYWORD};
use crate::project::{PropertyRecord, PropertyValue};

pub const EVENT_HANDLER_TAG: &str = "_event/EventHandler";
pub const ACTION_TAG: &str = "_event/action";

/// What an action decoder may know about its surroundings
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    /// ESPHome keyword of the widget owning the handler
    pub owner_keyword: &'a str,
    pub identities: &'a IdentityIndex,
}

impl<'a> ActionContext<'a> {
    fn resolve(&self, guid: &str) -> Option<&'a str> {
        let slug = self.identities.resolve(guid);
        if slug.is_none() {
            tracing::warn!("Action target {} has no named widget, dropping step", guid);
        }
        slug
    }

    /// Implicit argument handed to a called script
    fn call_argument(&self) -> &'static str {
        match self.owner_keyword {
            TABVIEW_KEYWORD => "tab",
            LABEL_KEYWORD => "text",
            _ => "x",
        }
    }
}

/// Supported action verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    CallFunction,
    LabelProperty,
    ChangeScreen,
    IncrementArc,
    IncrementBar,
    IncrementSlider,
    BasicProperty,
    SetOpacity,
    SliderProperty,
    BarProperty,
    RollerProperty,
    StepSpinbox,
    ModifyFlag,
    ModifyState,
    KeyboardSetTarget,
    SetTextFromArc,
    SetTextFromSlider,
    SetTextWhenChecked,
}

impl ActionKind {
    pub const ALL: [ActionKind; 18] = [
        ActionKind::CallFunction,
        ActionKind::LabelProperty,
        ActionKind::ChangeScreen,
        ActionKind::IncrementArc,
        ActionKind::IncrementBar,
        ActionKind::IncrementSlider,
        ActionKind::BasicProperty,
        ActionKind::SetOpacity,
        ActionKind::SliderProperty,
        ActionKind::BarProperty,
        ActionKind::RollerProperty,
        ActionKind::StepSpinbox,
        ActionKind::ModifyFlag,
        ActionKind::ModifyState,
        ActionKind::KeyboardSetTarget,
        ActionKind::SetTextFromArc,
        ActionKind::SetTextFromSlider,
        ActionKind::SetTextWhenChecked,
    ];

    pub fn from_verb(verb: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.verb() == verb)
    }

    /// Verb string as written by SquareLine; also the field tag prefix
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::CallFunction => "CALL FUNCTION",
            ActionKind::LabelProperty => "LABEL_PROPERTY",
            ActionKind::ChangeScreen => "CHANGE SCREEN",
            ActionKind::IncrementArc => "INCREMENT ARC",
            ActionKind::IncrementBar => "INCREMENT BAR",
            ActionKind::IncrementSlider => "INCREMENT SLIDER",
            ActionKind::BasicProperty => "BASIC_PROPERTY",
            ActionKind::SetOpacity => "SET OPACITY",
            ActionKind::SliderProperty => "SLIDER_PROPERTY",
            ActionKind::BarProperty => "BAR_PROPERTY",
            ActionKind::RollerProperty => "ROLLER_PROPERTY",
            ActionKind::StepSpinbox => "STEP SPINBOX",
            ActionKind::ModifyFlag => "MODIFY FLAG",
            ActionKind::ModifyState => "MODIFY STATE",
            ActionKind::KeyboardSetTarget => "KEYBOARD SET TARGET",
            ActionKind::SetTextFromArc => "SET TEXT VALUE FROM ARC",
            ActionKind::SetTextFromSlider => "SET TEXT VALUE FROM SLIDER",
            ActionKind::SetTextWhenChecked => "SET TEXT VALUE WHEN CHECKED",
        }
    }

    /// Decode one action into a callback step, or decline with `None`
    pub fn decode(self, action: &PropertyRecord, ctx: &ActionContext<'_>) -> Option<Value> {
        let fields = ActionFields {
            verb: self.verb(),
            action,
        };

        let step = match self {
            ActionKind::CallFunction => {
                let script = fields.text("Function_name")?;
                mapping! {
                    "lambda" => format!("id({})->execute({});", script, ctx.call_argument()),
                }
            }
            ActionKind::LabelProperty => {
                let target = fields.text("Target")?;
                let property = fields.text("Property")?;
                let value = fields.text("Value")?;
                let id = ctx.resolve(target)?;
                mapping! {
                    "lvgl.label.update" => mapping! {
                        "id" => id,
                        property.to_lowercase() => value,
                    },
                }
            }
            ActionKind::ChangeScreen => {
                let id = ctx.resolve(fields.text("Screen_to")?)?;
                let mut show = mapping! { "id" => id };
                if let Some(fade) = fields.text("Fade_mode") {
                    show.insert("animation".into(), Value::Str(fade.to_lowercase()));
                }
                let speed = fields.field("Speed").map(|r| r.as_int().unwrap_or(500));
                if let Some(speed) = speed.filter(|s| *s != 0) {
                    show.insert("time".into(), Value::Str(format!("{speed}ms")));
                }
                mapping! { "lvgl.page.show" => show }
            }
            ActionKind::IncrementArc => {
                let target = fields.text("Target")?;
                let delta = fields.field("Value")?.as_int().unwrap_or(0);
                let id = ctx.resolve(target)?;
                mapping! {
                    "lvgl.arc.update" => mapping! {
                        "id" => id,
                        "value" => increment_lambda("arc", delta, id),
                    },
                }
            }
            ActionKind::IncrementBar | ActionKind::IncrementSlider => {
                let widget = if self == ActionKind::IncrementBar { "bar" } else { "slider" };
                let target = fields.text("Target")?;
                let delta = fields.field("Value")?.as_int().unwrap_or(0);
                let animated = fields.text("Animate") == Some("ON");
                let id = ctx.resolve(target)?;
                mapping! {
                    format!("lvgl.{widget}.update") => mapping! {
                        "id" => id,
                        "animated" => animated,
                        "value" => increment_lambda(widget, delta, id),
                    },
                }
            }
            ActionKind::BasicProperty => {
                let target = fields.text("Target")?;
                let property = fields.text("Property")?;
                let value = fields.scalar("Value")?;
                let id = ctx.resolve(target)?;
                mapping! {
                    "lvgl.widget.update" => mapping! {
                        "id" => id,
                        widget_property(property) => value,
                    },
                }
            }
            ActionKind::SetOpacity => {
                let target = fields.text("Target")?;
                let value = fields.field("Value")?.as_int().unwrap_or(255);
                let id = ctx.resolve(target)?;
                mapping! {
                    "lvgl.widget.update" => mapping! {
                        "id" => id,
                        "opa" => value as f64 / 255.0,
                    },
                }
            }
            ActionKind::SliderProperty | ActionKind::BarProperty => {
                let widget = if self == ActionKind::SliderProperty { "slider" } else { "bar" };
                let target = fields.text("Target")?;
                let property = fields.text("Property")?;
                let value = match fields.scalar("Value")? {
                    Value::Int(i) => i,
                    Value::Str(s) => s.trim().parse().ok()?,
                    _ => return None,
                };
                let id = ctx.resolve(target)?;
                mapping! {
                    format!("lvgl.{widget}.update") => mapping! {
                        "id" => id,
                        "animated" => property == "Value_with_anim",
                        "value" => value,
                    },
                }
            }
            ActionKind::RollerProperty => {
                let target = fields.text("Target")?;
                let property = fields.text("Property")?;
                let value = fields.scalar("Value")?;
                let id = ctx.resolve(target)?;
                mapping! {
                    "lvgl.roller.update" => mapping! {
                        "id" => id,
                        "animated" => property == "Value_with_anim",
                        "selected_text" => value,
                    },
                }
            }
            ActionKind::StepSpinbox => {
                let target = fields.text("Target")?;
                let direction = match fields.scalar("Direction")? {
                    Value::Int(i) => i,
                    Value::Str(s) => s.trim().parse().ok()?,
                    _ => return None,
                };
                let id = ctx.resolve(target)?;
                let verb = match direction {
                    1 => "lvgl.spinbox.increment",
                    -1 => "lvgl.spinbox.decrement",
                    _ => return None,
                };
                mapping! { verb => mapping! { "id" => id } }
            }
            ActionKind::ModifyFlag => {
                let target = fields.text("Object")?;
                let flag = fields.text("Flag")?;
                let action = fields.text("Action")?;
                let id = ctx.resolve(target)?;
                let state = match action {
                    "REMOVE" => Value::Bool(false),
                    "TOGGLE" => Value::Lambda(format!(
                        "return !lv_obj_has_flag(id({id}), LV_OBJ_FLAG_{});",
                        flag.to_uppercase()
                    )),
                    _ => Value::Bool(true),
                };
                mapping! {
                    "lvgl.widget.update" => mapping! {
                        "id" => id,
                        flag.to_lowercase() => state,
                    },
                }
            }
            ActionKind::ModifyState => {
                let target = fields.text("Object")?;
                let state = fields.text("State")?;
                let action = fields.text("Action")?;
                let id = ctx.resolve(target)?;
                let value = match action {
                    "REMOVE" => Value::Bool(false),
                    "TOGGLE" => Value::Lambda(format!(
                        "return !lv_obj_has_state(id({id}), LV_STATE_{});",
                        state.to_uppercase()
                    )),
                    _ => Value::Bool(true),
                };
                mapping! {
                    "lvgl.widget.update" => mapping! {
                        "id" => id,
                        "state" => mapping! { state.to_lowercase() => value },
                    },
                }
            }
            ActionKind::KeyboardSetTarget => {
                let keyboard = fields.text("Keyboard")?;
                let textarea = fields.text("TextArea")?;
                let keyboard = ctx.resolve(keyboard)?;
                let textarea = ctx.resolve(textarea)?;
                mapping! {
                    "lvgl.keyboard.update" => mapping! {
                        "id" => keyboard,
                        "textarea" => textarea,
                    },
                }
            }
            ActionKind::SetTextFromArc | ActionKind::SetTextFromSlider => {
                let id = ctx.resolve(fields.text("Target")?)?;
                let prefix = fields.text("Prefix").unwrap_or("");
                let postfix = fields.text("Postfix").unwrap_or("");
                label_text(
                    id,
                    "%s%d%s",
                    vec![format!("\"{prefix}\""), "x".to_string(), format!("\"{postfix}\"")],
                )
            }
            ActionKind::SetTextWhenChecked => {
                let target = fields.text("Target")?;
                let on_text = fields.text("On_text")?;
                let off_text = fields.text("Off_text")?;
                let id = ctx.resolve(target)?;
                label_text(id, "%s", vec![format!("x ? \"{on_text}\" : \"{off_text}\"")])
            }
        };

        Some(Value::Map(step))
    }
}

/// Parameters of one action, looked up as `<VERB>/<name>`
struct ActionFields<'r> {
    verb: &'static str,
    action: &'r PropertyRecord,
}

impl<'r> ActionFields<'r> {
    fn field(&self, name: &str) -> Option<&'r PropertyRecord> {
        let tag = format!("{}/{}", self.verb, name);
        self.action.child(&tag)
    }

    /// Non-empty string parameter
    fn text(&self, name: &str) -> Option<&'r str> {
        self.field(name)?.as_str().filter(|s| !s.is_empty())
    }

    /// Integer parameter if present, else its string
    fn scalar(&self, name: &str) -> Option<Value> {
        match &self.field(name)?.value {
            PropertyValue::Integer(i) => Some(Value::Int(*i)),
            PropertyValue::Text(s) => Some(Value::str(s.as_str())),
            _ => None,
        }
    }
}

fn increment_lambda(widget: &str, delta: i64, id: &str) -> Value {
    Value::Lambda(format!(
        "return float({delta} + lv_{widget}_get_value(id({id})));"
    ))
}

fn label_text(id: &str, format: &str, args: Vec<String>) -> Mapping {
    mapping! {
        "lvgl.label.update" => mapping! {
            "id" => id,
            "text" => mapping! { "format" => format, "args" => args },
        },
    }
}

/// ESPHome property name for a `BASIC_PROPERTY` action
fn widget_property(property: &str) -> String {
    match property {
        "Position_X" => "x".to_string(),
        "Position_Y" => "y".to_string(),
        other => other.to_lowercase().replace(' ', "_"),
    }
}

/// Translate one event handler into `(trigger key, steps)`.
///
/// `None` for events ESPHome has no trigger for.
pub fn translate_handler(
    handler: &PropertyRecord,
    ctx: &ActionContext<'_>,
) -> Option<(String, Vec<Value>)> {
    let event = handler.as_str()?;
    let Some(target) = target_event(event) else {
        tracing::debug!("Unsupported event {}", event);
        return None;
    };

    let mut steps = Vec::new();
    for action in handler.records().iter().filter(|r| r.tag == ACTION_TAG) {
        let Some(verb) = action.as_str() else {
            continue;
        };
        match ActionKind::from_verb(verb) {
            Some(kind) => steps.extend(kind.decode(action, ctx)),
            None => tracing::debug!("Unsupported action {}", verb),
        }
    }

    Some((format!("on_{target}"), steps))
}

/// Translate every handler of a widget into `on_<event>: {then: [...]}`
/// entries. Handlers for the same event share one `then` list; events that
/// produced no steps are left out.
pub fn translate_handlers<'h>(
    handlers: impl IntoIterator<Item = &'h PropertyRecord>,
    ctx: &ActionContext<'_>,
) -> Mapping {
    let mut triggers: Vec<(String, Vec<Value>)> = Vec::new();
    for handler in handlers {
        let Some((key, steps)) = translate_handler(handler, ctx) else {
            continue;
        };
        match triggers.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, all)) => all.extend(steps),
            None => triggers.push((key, steps)),
        }
    }

    triggers
        .into_iter()
        .filter(|(_, steps)| !steps.is_empty())
        .map(|(key, steps)| (key, Value::Map(mapping! { "then" => steps })))
        .collect()
}
