//! Button-driven pagination over sequences of reply payloads.
//!
//! Sessions live only in process memory; a restart orphans them and the
//! button handler reports them as expired.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::payload::{Button, ButtonStyle, ControlRow, ReplyPayload};
use crate::Result;

/// The live message a session draws into.
#[async_trait]
pub trait PageTarget: Send + Sync {
    /// Replace the message contents with the rendered page.
    async fn draw(&self, page: ReplyPayload) -> Result<()>;
    /// Remove the message entirely.
    async fn delete(&self) -> Result<()>;
}

/// A pagination button action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavAction {
    Prev,
    Next,
    Save,
    Delete,
}

impl NavAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prev" => Some(Self::Prev),
            "next" => Some(Self::Next),
            "save" => Some(Self::Save),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

pub const CONTROL_PREFIX: &str = "paginate";

/// The four-button navigation row for a session.
pub fn control_row(session_id: &str) -> ControlRow {
    let control = |action: &str, emoji: &str, style: ButtonStyle| {
        Button::new(format!("{CONTROL_PREFIX}|{action}:{session_id}"), style).emoji(emoji)
    };

    ControlRow {
        buttons: vec![
            control("prev", "⬅️", ButtonStyle::Primary),
            control("next", "➡️", ButtonStyle::Primary),
            control("save", "✅", ButtonStyle::Success),
            control("delete", "🗑️", ButtonStyle::Danger),
        ],
    }
}

struct PageSession {
    target: Arc<dyn PageTarget>,
    pages: Vec<ReplyPayload>,
    index: usize,
}

impl PageSession {
    /// Render the current page, with the navigation row prepended to the
    /// page's own controls, or with every control stripped.
    fn render(&self, controls: Option<&str>) -> ReplyPayload {
        let mut page = self.pages[self.index].clone();
        match controls {
            Some(id) => {
                let mut components = vec![control_row(id)];
                components.append(&mut page.components);
                page.components = components;
            }
            None => page.components = Vec::new(),
        }
        page
    }
}

/// Registry of live sessions, injected so tests get an isolated store.
#[derive(Default)]
pub struct PageRegistry {
    sessions: Mutex<HashMap<String, PageSession>>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the first page with navigation controls and register the
    /// session. Returns the session id embedded in the controls.
    pub async fn start(
        &self,
        target: Arc<dyn PageTarget>,
        pages: Vec<ReplyPayload>,
    ) -> Result<String> {
        debug_assert!(!pages.is_empty());
        let id = uuid::Uuid::new_v4().to_string();

        let session = PageSession {
            target: target.clone(),
            pages,
            index: 0,
        };
        let first = session.render(Some(&id));
        self.sessions.lock().await.insert(id.clone(), session);

        target.draw(first).await?;
        Ok(id)
    }

    /// Advance one page. `Some(true)` drew, `Some(false)` hit the end,
    /// `None` unknown session.
    pub async fn next(&self, id: &str) -> Result<Option<bool>> {
        self.step(id, 1).await
    }

    /// Go back one page; same contract as [`PageRegistry::next`].
    pub async fn prev(&self, id: &str) -> Result<Option<bool>> {
        self.step(id, -1).await
    }

    async fn step(&self, id: &str, delta: isize) -> Result<Option<bool>> {
        let (target, page) = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(id) else {
                return Ok(None);
            };

            let next = session.index as isize + delta;
            if next < 0 || next as usize >= session.pages.len() {
                return Ok(Some(false));
            }

            session.index = next as usize;
            (session.target.clone(), session.render(Some(id)))
        };

        target.draw(page).await?;
        Ok(Some(true))
    }

    /// Freeze the message at its current page, controls removed, and forget
    /// the session.
    pub async fn save(&self, id: &str) -> Result<bool> {
        let Some(session) = self.sessions.lock().await.remove(id) else {
            return Ok(false);
        };
        session.target.draw(session.render(None)).await?;
        Ok(true)
    }

    /// Delete the underlying message and forget the session.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let Some(session) = self.sessions.lock().await.remove(id) else {
            return Ok(false);
        };
        session.target.delete().await?;
        Ok(true)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.lock().await.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockTarget {
        draws: AtomicUsize,
        deletes: AtomicUsize,
        last_components: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl PageTarget for MockTarget {
        async fn draw(&self, page: ReplyPayload) -> Result<()> {
            self.draws.fetch_add(1, Ordering::SeqCst);
            *self.last_components.lock().await = Some(page.components.len());
            Ok(())
        }

        async fn delete(&self) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn pages(n: usize) -> Vec<ReplyPayload> {
        (0..n).map(|i| ReplyPayload::text(format!("page {i}"))).collect()
    }

    #[tokio::test]
    async fn start_draws_first_page_with_controls() {
        let registry = PageRegistry::new();
        let target = Arc::new(MockTarget::default());

        let id = registry.start(target.clone(), pages(3)).await.unwrap();

        assert!(registry.contains(&id).await);
        assert_eq!(target.draws.load(Ordering::SeqCst), 1);
        assert_eq!(*target.last_components.lock().await, Some(1));
    }

    #[tokio::test]
    async fn navigation_never_leaves_bounds() {
        let registry = PageRegistry::new();
        let target = Arc::new(MockTarget::default());
        let id = registry.start(target.clone(), pages(3)).await.unwrap();

        // At index 0: prev is a reported no-op, then next/next draw, and a
        // final next at the last page does not.
        assert_eq!(registry.prev(&id).await.unwrap(), Some(false));
        assert_eq!(registry.next(&id).await.unwrap(), Some(true));
        assert_eq!(registry.next(&id).await.unwrap(), Some(true));
        assert_eq!(registry.next(&id).await.unwrap(), Some(false));

        // 1 initial draw + 2 navigation draws.
        assert_eq!(target.draws.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn save_redraws_without_controls_and_unregisters() {
        let registry = PageRegistry::new();
        let target = Arc::new(MockTarget::default());
        let id = registry.start(target.clone(), pages(2)).await.unwrap();

        assert!(registry.save(&id).await.unwrap());
        assert!(!registry.contains(&id).await);
        assert_eq!(*target.last_components.lock().await, Some(0));
        assert_eq!(target.deletes.load(Ordering::SeqCst), 0);

        // Session is gone; every action now reports unknown.
        assert_eq!(registry.next(&id).await.unwrap(), None);
        assert!(!registry.save(&id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_message_and_unregisters() {
        let registry = PageRegistry::new();
        let target = Arc::new(MockTarget::default());
        let id = registry.start(target.clone(), pages(2)).await.unwrap();

        assert!(registry.delete(&id).await.unwrap());
        assert!(!registry.contains(&id).await);
        assert_eq!(target.deletes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn control_row_embeds_session_id() {
        let row = control_row("abc");
        assert_eq!(row.buttons.len(), 4);
        assert_eq!(row.buttons[0].custom_id, "paginate|prev:abc");
        assert_eq!(row.buttons[3].custom_id, "paginate|delete:abc");
    }

    #[test]
    fn nav_action_parses() {
        assert_eq!(NavAction::parse("next"), Some(NavAction::Next));
        assert_eq!(NavAction::parse("nope"), None);
    }
}
