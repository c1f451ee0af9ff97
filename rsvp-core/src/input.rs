use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Blocking source of categorical responses.
pub trait ResponseCollector {
    /// Wait for a completed response drawn from `alphabet`. Abort surfaces
    /// as `SessionError::Aborted`.
    fn collect(&mut self, alphabet: &ResponseAlphabet) -> Result<String, SessionError>;

    /// Show an instruction screen and wait for the continue key.
    fn acknowledge(&mut self, message: &str) -> Result<(), SessionError>;
}

impl<C: ResponseCollector + ?Sized> ResponseCollector for &mut C {
    fn collect(&mut self, alphabet: &ResponseAlphabet) -> Result<String, SessionError> {
        (**self).collect(alphabet)
    }

    fn acknowledge(&mut self, message: &str) -> Result<(), SessionError> {
        (**self).acknowledge(message)
    }
}

/// Valid response symbols for a trial type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseAlphabet {
    /// A-Z, typed and confirmed with Enter.
    Letters,
    /// Single Y or N key, accepted immediately.
    YesNo,
    /// One symbol out of a fixed set, confirmed with Enter.
    Symbols(Vec<char>),
}

impl ResponseAlphabet {
    pub fn accepts(&self, symbol: char) -> bool {
        match self {
            ResponseAlphabet::Letters => symbol.is_ascii_uppercase(),
            ResponseAlphabet::YesNo => symbol == 'Y' || symbol == 'N',
            ResponseAlphabet::Symbols(set) => set.contains(&symbol),
        }
    }

    /// A new symbol replaces the typed one instead of appending.
    pub fn is_single_symbol(&self) -> bool {
        !matches!(self, ResponseAlphabet::Letters)
    }

    /// The first accepted key completes the response without Enter.
    pub fn submits_on_key(&self) -> bool {
        matches!(self, ResponseAlphabet::YesNo)
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            ResponseAlphabet::Letters => "Which letter did you see? (type the letter and press ENTER)",
            ResponseAlphabet::YesNo => "Did you see the target? (Y/N)",
            ResponseAlphabet::Symbols(_) => "Which symbol did you see? (type it and press ENTER)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Key { name: String, shift: bool },
    Backspace,
    Enter,
    Escape,
}

impl KeyEvent {
    pub fn key(name: impl Into<String>) -> Self {
        KeyEvent::Key {
            name: name.into(),
            shift: false,
        }
    }

    pub fn shifted(name: impl Into<String>) -> Self {
        KeyEvent::Key {
            name: name.into(),
            shift: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    pub symbol: char,
}

/// Declarative key-to-symbol table. A shifted lookup falls back to the
/// unshifted binding when no shift-specific entry exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    pub bindings: Vec<KeyBinding>,
}

impl KeyMap {
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Letter keys plus the `= + -` symbol keys of a US layout and keypad.
    pub fn standard() -> Self {
        let mut map = Self::empty();
        for letter in 'a'..='z' {
            map = map.bind(letter.to_string(), false, letter.to_ascii_uppercase());
        }
        map.bind("equal", false, '=')
            .bind("equal", true, '+')
            .bind("plus", false, '+')
            .bind("minus", false, '-')
            .bind("kp_add", false, '+')
            .bind("kp_subtract", false, '-')
            .bind("kp_equal", false, '=')
    }

    pub fn bind(mut self, key: impl Into<String>, shift: bool, symbol: char) -> Self {
        let key = key.into();
        self.bindings.retain(|b| !(b.key == key && b.shift == shift));
        self.bindings.push(KeyBinding { key, shift, symbol });
        self
    }

    pub fn symbol_for(&self, key: &str, shift: bool) -> Option<char> {
        self.bindings
            .iter()
            .find(|b| b.key == key && b.shift == shift)
            .or_else(|| self.bindings.iter().find(|b| b.key == key && !b.shift))
            .map(|b| b.symbol)
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// Raw keyboard events, one at a time.
pub trait KeySource {
    fn next_key(&mut self) -> Result<KeyEvent, SessionError>;

    /// Present text to the participant before waiting for keys.
    fn prompt(&mut self, _text: &str) {}

    /// Echo the response typed so far.
    fn echo(&mut self, _typed: &str) {}
}

/// Turns raw key events into responses through a `KeyMap`.
pub struct KeyedCollector<S> {
    source: S,
    keymap: KeyMap,
}

impl<S: KeySource> KeyedCollector<S> {
    pub fn new(source: S, keymap: KeyMap) -> Self {
        Self { source, keymap }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: KeySource> ResponseCollector for KeyedCollector<S> {
    fn collect(&mut self, alphabet: &ResponseAlphabet) -> Result<String, SessionError> {
        self.source.prompt(alphabet.prompt());
        let mut typed = String::new();
        loop {
            match self.source.next_key()? {
                KeyEvent::Escape => return Err(SessionError::Aborted),
                KeyEvent::Enter => {
                    if !typed.is_empty() {
                        return Ok(typed);
                    }
                }
                KeyEvent::Backspace => {
                    typed.pop();
                }
                KeyEvent::Key { name, shift } => {
                    let Some(symbol) = self
                        .keymap
                        .symbol_for(&name, shift)
                        .filter(|s| alphabet.accepts(*s))
                    else {
                        continue;
                    };
                    if alphabet.submits_on_key() {
                        return Ok(symbol.to_string());
                    }
                    if alphabet.is_single_symbol() {
                        typed.clear();
                    }
                    typed.push(symbol);
                }
            }
            self.source.echo(&typed);
        }
    }

    fn acknowledge(&mut self, message: &str) -> Result<(), SessionError> {
        self.source.prompt(message);
        loop {
            match self.source.next_key()? {
                KeyEvent::Escape => return Err(SessionError::Aborted),
                KeyEvent::Enter => return Ok(()),
                KeyEvent::Key { name, .. } if name == "space" => return Ok(()),
                _ => {}
            }
        }
    }
}
