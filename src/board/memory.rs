//! In-memory board.
//!
//! Serves a fixed board snapshot through [`BoardApi`], with switches to make
//! individual endpoints fail. Used for fixtures, tests and benchmarks.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{
    Board, BoardApi, BoardError, BoardItem, BoardResult, Connector, Group, Tag,
};

/// Endpoints that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Endpoint {
    Board,
    Items,
    Connectors,
    Groups,
    Tags,
    ItemTags,
}

/// A board snapshot held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBoard {
    board: Board,
    items: Vec<BoardItem>,
    connectors: Vec<Connector>,
    groups: Vec<(Group, Vec<String>)>,
    tags: Vec<Tag>,
    item_tags: HashMap<String, Vec<Tag>>,
    failing: HashSet<Endpoint>,
    failing_groups: HashSet<String>,
    item_page_requests: AtomicUsize,
    item_tag_requests: AtomicUsize,
}

impl InMemoryBoard {
    /// Create an empty board with the given ID.
    pub fn new(board_id: impl Into<String>) -> Self {
        let id = board_id.into();
        Self {
            board: Board { name: format!("Board {}", id), id, ..Default::default() },
            ..Default::default()
        }
    }

    /// Set the board name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.board.name = name.into();
        self
    }

    /// Set the board description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.board.description = Some(description.into());
        self
    }

    /// Add items.
    pub fn with_items(mut self, items: impl IntoIterator<Item = BoardItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Add connectors.
    pub fn with_connectors(mut self, connectors: impl IntoIterator<Item = Connector>) -> Self {
        self.connectors.extend(connectors);
        self
    }

    /// Add a group containing the given item IDs.
    pub fn with_group<I, S>(mut self, group_id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = Group { id: group_id.into(), kind: Some("group".to_string()) };
        self.groups.push((group, members.into_iter().map(Into::into).collect()));
        self
    }

    /// Add board-level tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Attach tags to an item.
    pub fn with_item_tags(
        mut self,
        item_id: impl Into<String>,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Self {
        self.item_tags.entry(item_id.into()).or_default().extend(tags);
        self
    }

    /// Make board metadata lookups fail.
    pub fn failing_board(self) -> Self {
        self.failing(Endpoint::Board)
    }

    /// Make item listing fail.
    pub fn failing_items(self) -> Self {
        self.failing(Endpoint::Items)
    }

    /// Make connector listing fail.
    pub fn failing_connectors(self) -> Self {
        self.failing(Endpoint::Connectors)
    }

    /// Make group listing fail.
    pub fn failing_groups(self) -> Self {
        self.failing(Endpoint::Groups)
    }

    /// Make board tag listing fail.
    pub fn failing_tags(self) -> Self {
        self.failing(Endpoint::Tags)
    }

    /// Make every per-item tag lookup fail.
    pub fn failing_item_tags(self) -> Self {
        self.failing(Endpoint::ItemTags)
    }

    /// Make the member lookup of one group fail.
    pub fn failing_group(mut self, group_id: impl Into<String>) -> Self {
        self.failing_groups.insert(group_id.into());
        self
    }

    /// Number of item pages requested so far.
    pub fn item_page_requests(&self) -> usize {
        self.item_page_requests.load(Ordering::Relaxed)
    }

    /// Number of per-item tag lookups so far.
    pub fn item_tag_requests(&self) -> usize {
        self.item_tag_requests.load(Ordering::Relaxed)
    }

    fn failing(mut self, endpoint: Endpoint) -> Self {
        self.failing.insert(endpoint);
        self
    }

    fn check(&self, board_id: &str, endpoint: Endpoint) -> BoardResult<()> {
        if board_id != self.board.id {
            return Err(BoardError::NotFound(format!("board {}", board_id)));
        }
        if self.failing.contains(&endpoint) {
            return Err(BoardError::Api {
                status: 500,
                message: format!("{:?} endpoint unavailable", endpoint),
            });
        }
        Ok(())
    }
}

fn window<T: Clone>(all: &[T], limit: u32, offset: u32) -> Vec<T> {
    all.iter().skip(offset as usize).take(limit as usize).cloned().collect()
}

#[async_trait]
impl BoardApi for InMemoryBoard {
    async fn list_boards(&self, limit: u32, offset: u32) -> BoardResult<Vec<Board>> {
        Ok(window(std::slice::from_ref(&self.board), limit, offset))
    }

    async fn get_board(&self, board_id: &str) -> BoardResult<Board> {
        self.check(board_id, Endpoint::Board)?;
        Ok(self.board.clone())
    }

    async fn list_items(
        &self,
        board_id: &str,
        limit: u32,
        offset: u32,
    ) -> BoardResult<Vec<BoardItem>> {
        self.item_page_requests.fetch_add(1, Ordering::Relaxed);
        self.check(board_id, Endpoint::Items)?;
        Ok(window(&self.items, limit, offset))
    }

    async fn list_connectors(&self, board_id: &str, limit: u32) -> BoardResult<Vec<Connector>> {
        self.check(board_id, Endpoint::Connectors)?;
        Ok(window(&self.connectors, limit, 0))
    }

    async fn list_groups(&self, board_id: &str, limit: u32) -> BoardResult<Vec<Group>> {
        self.check(board_id, Endpoint::Groups)?;
        let groups: Vec<Group> = self.groups.iter().map(|(g, _)| g.clone()).collect();
        Ok(window(&groups, limit, 0))
    }

    async fn list_group_items(
        &self,
        board_id: &str,
        group_id: &str,
    ) -> BoardResult<Vec<BoardItem>> {
        self.check(board_id, Endpoint::Groups)?;
        if self.failing_groups.contains(group_id) {
            return Err(BoardError::Api {
                status: 500,
                message: format!("group {} unavailable", group_id),
            });
        }

        let (_, members) = self
            .groups
            .iter()
            .find(|(g, _)| g.id == group_id)
            .ok_or_else(|| BoardError::NotFound(format!("group {}", group_id)))?;

        Ok(members
            .iter()
            .map(|id| {
                self.items.iter().find(|item| &item.id == id).cloned().unwrap_or_else(|| {
                    BoardItem { id: id.clone(), ..Default::default() }
                })
            })
            .collect())
    }

    async fn list_tags(&self, board_id: &str) -> BoardResult<Vec<Tag>> {
        self.check(board_id, Endpoint::Tags)?;
        Ok(self.tags.clone())
    }

    async fn list_item_tags(&self, board_id: &str, item_id: &str) -> BoardResult<Vec<Tag>> {
        self.item_tag_requests.fetch_add(1, Ordering::Relaxed);
        self.check(board_id, Endpoint::ItemTags)?;
        Ok(self.item_tags.get(item_id).cloned().unwrap_or_default())
    }
}
