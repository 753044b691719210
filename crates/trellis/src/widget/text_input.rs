//! Text input contract.
//!
//! [`TextInputClient`] is the capability the desktop queries to find the
//! active text-input target for IME integration. [`TextEditor`] is the
//! editing widget's public surface: configuration, text/caret/selection
//! state, and its listener signals. Layout, word wrap rendering, and
//! undo/redo are out of scope and delegated to larger subsystems.

use std::ops::Range;

use trellis_core::signal::Signal;

use super::base::WidgetBase;
use super::events::{Key, WidgetEvent};
use super::{FocusPolicy, Widget};

/// Capability queried on the focused widget to drive text input.
pub trait TextInputClient {
    /// Whether this client currently accepts text input.
    fn is_text_input_active(&self) -> bool;

    /// Insert text at the caret, replacing any selection.
    fn insert_text_at_caret(&mut self, text: &str);

    /// Caret index, in chars.
    fn caret_position(&self) -> usize;

    /// Move the caret, clamped to the text length.
    fn set_caret_position(&mut self, index: usize);

    /// The selected char range (empty when nothing is selected).
    fn highlighted_region(&self) -> Range<usize>;

    /// Select a char range, clamped to the text length.
    fn set_highlighted_region(&mut self, range: Range<usize>);

    /// Mark composition ranges during IME preedit.
    fn set_temporary_underlining(&mut self, ranges: &[Range<usize>]) {
        let _ = ranges;
    }
}

/// A single- or multi-line text editing widget.
///
/// Only the public contract is implemented here: text storage, caret and
/// selection bookkeeping, configuration flags, and the listener signals.
///
/// # Signals
///
/// - `text_changed`: the text was modified
/// - `return_pressed`: Enter pressed (single-line, or when Enter does not
///   insert a newline)
/// - `escape_pressed`: Escape pressed
/// - `focus_lost`: keyboard focus moved away
pub struct TextEditor {
    base: WidgetBase,
    text: String,
    caret: usize,
    selection: Range<usize>,
    read_only: bool,
    multi_line: bool,
    return_key_starts_new_line: bool,
    tab_key_used_as_character: bool,
    select_all_when_focused: bool,
    password_character: Option<char>,
    max_text_length: usize,
    allowed_characters: Option<String>,

    /// Signal emitted when the text changes.
    pub text_changed: Signal<()>,
    /// Signal emitted when Enter is pressed without inserting a newline.
    pub return_pressed: Signal<()>,
    /// Signal emitted when Escape is pressed.
    pub escape_pressed: Signal<()>,
    /// Signal emitted when the editor loses focus.
    pub focus_lost: Signal<()>,
}

impl TextEditor {
    /// Create an empty single-line editor.
    pub fn new() -> Self {
        let mut base = WidgetBase::new();
        base.set_focus_policy(FocusPolicy::StrongFocus);
        Self {
            base,
            text: String::new(),
            caret: 0,
            selection: 0..0,
            read_only: false,
            multi_line: false,
            return_key_starts_new_line: false,
            tab_key_used_as_character: false,
            select_all_when_focused: false,
            password_character: None,
            max_text_length: 0,
            allowed_characters: None,
            text_changed: Signal::new(),
            return_pressed: Signal::new(),
            escape_pressed: Signal::new(),
            focus_lost: Signal::new(),
        }
    }

    /// Builder: multi-line mode.
    pub fn with_multi_line(mut self, multi_line: bool) -> Self {
        self.multi_line = multi_line;
        self
    }

    /// Builder: read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.set_read_only(read_only);
        self
    }

    pub fn is_multi_line(&self) -> bool {
        self.multi_line
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Whether Enter inserts a newline instead of firing `return_pressed`.
    pub fn set_return_key_starts_new_line(&mut self, starts_new_line: bool) {
        self.return_key_starts_new_line = starts_new_line;
    }

    pub fn return_key_starts_new_line(&self) -> bool {
        self.return_key_starts_new_line
    }

    /// Whether Tab inserts a tab character instead of moving focus.
    pub fn set_tab_key_used_as_character(&mut self, used: bool) {
        self.tab_key_used_as_character = used;
    }

    pub fn is_tab_key_used_as_character(&self) -> bool {
        self.tab_key_used_as_character
    }

    /// Select the whole text whenever the editor gains focus.
    pub fn set_select_all_when_focused(&mut self, select_all: bool) {
        self.select_all_when_focused = select_all;
    }

    /// Display a mask character instead of the text (password fields).
    pub fn set_password_character(&mut self, character: Option<char>) {
        self.password_character = character;
    }

    pub fn password_character(&self) -> Option<char> {
        self.password_character
    }

    /// Restrict input length (0 = unlimited) and allowed characters.
    pub fn set_input_restrictions(
        &mut self,
        max_text_length: usize,
        allowed_characters: Option<String>,
    ) {
        self.max_text_length = max_text_length;
        self.allowed_characters = allowed_characters;
    }

    /// The full text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the text. Caret and selection move to the end.
    pub fn set_text(&mut self, text: impl Into<String>, notify: bool) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        let end = self.char_len();
        self.caret = end;
        self.selection = end..end;
        if notify {
            self.text_changed.emit(());
        }
    }

    /// Delete everything.
    pub fn clear(&mut self) {
        self.set_text("", true);
    }

    /// The selected text.
    pub fn highlighted_text(&self) -> String {
        self.char_slice(self.selection.clone())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn char_slice(&self, range: Range<usize>) -> String {
        self.text
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_allowed(&self, c: char) -> bool {
        match &self.allowed_characters {
            Some(allowed) => allowed.contains(c),
            None => true,
        }
    }

    fn insert_char(&mut self, c: char) {
        if self.read_only || !self.char_allowed(c) {
            return;
        }
        self.insert_replacing_selection(&c.to_string());
    }

    fn insert_replacing_selection(&mut self, insert: &str) {
        if !self.selection.is_empty() {
            let start = self.byte_index(self.selection.start);
            let end = self.byte_index(self.selection.end);
            self.caret = self.selection.start;
            self.text.replace_range(start..end, "");
            self.selection = self.caret..self.caret;
        }
        let mut inserted = 0;
        for c in insert.chars() {
            if self.max_text_length > 0 && self.char_len() >= self.max_text_length {
                break;
            }
            let at = self.byte_index(self.caret);
            self.text.insert(at, c);
            self.caret += 1;
            inserted += 1;
        }
        self.selection = self.caret..self.caret;
        if inserted > 0 {
            self.text_changed.emit(());
        }
    }

    fn delete_backwards(&mut self) {
        if self.read_only {
            return;
        }
        if !self.selection.is_empty() {
            self.insert_replacing_selection("");
            return;
        }
        if self.caret == 0 {
            return;
        }
        let start = self.byte_index(self.caret - 1);
        let end = self.byte_index(self.caret);
        self.text.replace_range(start..end, "");
        self.caret -= 1;
        self.selection = self.caret..self.caret;
        self.text_changed.emit(());
    }

    /// Select the entire text.
    pub fn select_all(&mut self) {
        let end = self.char_len();
        self.selection = 0..end;
        self.caret = end;
    }
}

impl Default for TextEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for TextEditor {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn as_text_input(&mut self) -> Option<&mut dyn TextInputClient> {
        Some(self)
    }

    fn event(&mut self, event: &mut WidgetEvent) -> bool {
        match event {
            WidgetEvent::FocusIn(_) => {
                if self.select_all_when_focused {
                    self.select_all();
                }
                true
            }
            WidgetEvent::FocusOut(_) => {
                self.focus_lost.emit(());
                true
            }
            WidgetEvent::KeyPress(key_event) => {
                let key_event = *key_event;
                match key_event.key {
                    Key::Enter => {
                        if self.multi_line && self.return_key_starts_new_line {
                            self.insert_char('\n');
                        } else {
                            self.return_pressed.emit(());
                        }
                        true
                    }
                    Key::Escape => {
                        self.escape_pressed.emit(());
                        true
                    }
                    Key::Tab if self.tab_key_used_as_character => {
                        self.insert_char('\t');
                        true
                    }
                    Key::Tab => false,
                    Key::Backspace => {
                        self.delete_backwards();
                        true
                    }
                    Key::ArrowLeft => {
                        self.set_caret_position(self.caret.saturating_sub(1));
                        true
                    }
                    Key::ArrowRight => {
                        self.set_caret_position(self.caret + 1);
                        true
                    }
                    Key::Home => {
                        self.set_caret_position(0);
                        true
                    }
                    Key::End => {
                        let end = self.char_len();
                        self.set_caret_position(end);
                        true
                    }
                    _ => match key_event.text {
                        Some(c) if !c.is_control() => {
                            self.insert_char(c);
                            true
                        }
                        _ => false,
                    },
                }
            }
            _ => false,
        }
    }
}

impl TextInputClient for TextEditor {
    fn is_text_input_active(&self) -> bool {
        !self.read_only && self.base.is_enabled()
    }

    fn insert_text_at_caret(&mut self, text: &str) {
        if self.read_only {
            return;
        }
        let filtered: String = text.chars().filter(|c| self.char_allowed(*c)).collect();
        self.insert_replacing_selection(&filtered);
    }

    fn caret_position(&self) -> usize {
        self.caret
    }

    fn set_caret_position(&mut self, index: usize) {
        self.caret = index.min(self.char_len());
        self.selection = self.caret..self.caret;
    }

    fn highlighted_region(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn set_highlighted_region(&mut self, range: Range<usize>) {
        let len = self.char_len();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.selection = start..end;
        self.caret = end;
    }
}
