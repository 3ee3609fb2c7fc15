//! # Scripting Module
//!
//! Rhai host for frame actions and button handlers.
//!
//! ## Responsibilities
//! - **Engine Setup**: Registers the movie-clip API and routes script output to `tracing`.
//! - **Compilation**: Compiles every action of the movie once, up front. Op lists
//!   are lowered to Rhai source first.
//! - **Invocation**: Runs an action with `this` bound to a clip and bare names
//!   resolved through [`LocalScope`] then [`GlobalScope`].
//! - **Error Policy**: Script errors never escape an invocation; they are logged.
//!
//! ## Module Structure
//! - `types`: Handle type (`MovieClip`)
//! - `scope`: Global and local name scopes
//! - `ops`: Lowering of decoded op lists
//! - `api/`: Sub-modules registering functions with the engine

mod api;
pub mod ops;
pub mod scope;
pub mod types;

pub use scope::{GlobalScope, LocalScope};
pub use types::MovieClip;

use crate::button::ButtonEvent;
use crate::config::PlayerConfig;
use crate::systems::assets::MovieAssets;
use crate::types::{CharacterId, DefinitionKey};
use flashback_data::model::ActionData;
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Name of the function each action body is compiled into.
const ACTION_FN: &str = "action_body";

/// Identifies one compiled script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKey {
    Frame {
        timeline: DefinitionKey,
        frame: u32,
    },
    Button {
        character: CharacterId,
        event: ButtonEvent,
    },
    KeyPress {
        character: CharacterId,
        code: u8,
    },
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKey::Frame { timeline, frame } => write!(f, "{} frame {}", timeline, frame),
            ActionKey::Button { character, event } => write!(f, "button {} {}", character, event),
            ActionKey::KeyPress { character, code } => {
                write!(f, "button {} keyPress {}", character, code)
            }
        }
    }
}

/// Registers the movie-clip API into the provided Rhai `Engine`.
///
/// This exposes the `MovieClip` type, its methods and the global helpers.
pub fn register_rhai_api(engine: &mut Engine) {
    api::register_all(engine);
}

/// Owns the Rhai engine and the compiled actions of one movie.
pub struct ScriptHost {
    engine: Engine,
    current: Rc<RefCell<Option<LocalScope>>>,
    global: Rc<GlobalScope>,
    actions: HashMap<ActionKey, AST>,
}

impl ScriptHost {
    pub fn new(global: GlobalScope, config: &PlayerConfig) -> Self {
        let mut engine = Engine::new();
        engine.set_max_expr_depths(0, 0);
        if config.max_script_operations > 0 {
            engine.set_max_operations(config.max_script_operations);
        }
        if config.max_call_depth > 0 {
            engine.set_max_call_levels(config.max_call_depth);
        }
        engine.on_print(|text| info!(target: "flashback::script", "{}", text));
        engine.on_debug(|text, source, pos| {
            debug!(target: "flashback::script", source = source.unwrap_or(""), position = %pos, "{}", text)
        });
        register_rhai_api(&mut engine);

        let current: Rc<RefCell<Option<LocalScope>>> = Rc::new(RefCell::new(None));
        let resolver_scope = current.clone();
        engine.on_var(move |name, index, context| {
            // Locals declared by the script itself win.
            if index > 0 || context.scope().contains(name) {
                return Ok(None);
            }
            let current = resolver_scope.borrow();
            let Some(local) = current.as_ref() else {
                return Ok(None);
            };
            match local.resolve(name) {
                Some(value) => Ok(Some(value)),
                None => {
                    warn!(name, this = %local.this(), "Unresolved name in action");
                    Ok(Some(Dynamic::UNIT))
                }
            }
        });

        Self {
            engine,
            current,
            global: Rc::new(global),
            actions: HashMap::new(),
        }
    }

    /// Compiles every frame action and button handler in `assets`.
    ///
    /// Returns the number of actions that failed to compile.
    pub fn compile_library(&mut self, assets: &MovieAssets) -> usize {
        let mut failures = 0;
        let mut sources: Vec<(ActionKey, &ActionData)> = Vec::new();
        for definition in assets.timelines() {
            for (&frame, action) in &definition.actions {
                sources.push((
                    ActionKey::Frame {
                        timeline: definition.key,
                        frame,
                    },
                    action,
                ));
            }
        }
        for (&character, button) in &assets.buttons {
            for event in ButtonEvent::ALL {
                if let Some(action) = button.handler(event) {
                    sources.push((ActionKey::Button { character, event }, action));
                }
            }
            for (&code, action) in &button.data.key_press {
                sources.push((ActionKey::KeyPress { character, code }, action));
            }
        }

        for (key, action) in sources {
            if !self.compile(key, action) {
                failures += 1;
            }
        }
        debug!(compiled = self.actions.len(), failures, "Action library compiled");
        failures
    }

    /// Compiles one action. Failures are reported and leave the action absent.
    pub fn compile(&mut self, key: ActionKey, action: &ActionData) -> bool {
        let body = match action {
            ActionData::Script(source) => source.clone(),
            ActionData::Ops(ops) => match ops::lower(ops) {
                Ok(source) => source,
                Err(err) => {
                    warn!(action = %key, error = %err, "Action ops could not be lowered; ignoring");
                    return false;
                }
            },
        };
        let wrapped = format!("fn {}() {{\n{}\n}}", ACTION_FN, body);
        match self.engine.compile(&wrapped) {
            Ok(ast) => {
                self.actions.insert(key, ast);
                true
            }
            Err(err) => {
                warn!(action = %key, error = %err, "Action failed to compile; ignoring");
                false
            }
        }
    }

    pub fn has_action(&self, key: &ActionKey) -> bool {
        self.actions.contains_key(key)
    }

    /// Runs an action with `this` bound to `this`.
    ///
    /// Must not be called while the stage is borrowed.
    pub fn invoke(&self, key: &ActionKey, this: MovieClip) {
        let Some(ast) = self.actions.get(key) else {
            return;
        };

        let local = LocalScope::new(this.clone(), self.global.clone());
        let previous = self.current.replace(Some(local));

        let mut this_value = Dynamic::from(this);
        let mut scope = Scope::new();
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut this_value);
        let result =
            self.engine
                .call_fn_with_options::<Dynamic>(options, &mut scope, ast, ACTION_FN, ());

        self.current.replace(previous);

        if let Err(err) = result {
            warn!(action = %key, error = %err, "Action failed");
        }
    }
}
