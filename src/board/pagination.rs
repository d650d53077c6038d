//! Item paging.

use super::{BoardApi, BoardItem, BoardResult};

/// Items requested per page.
pub const PAGE_SIZE: u32 = 50;

/// Offset at which paging stops regardless of what the board holds.
///
/// Boards with more than `MAX_ITEM_OFFSET` items are truncated.
pub const MAX_ITEM_OFFSET: u32 = 500;

/// Fetch every item on a board, one page at a time.
///
/// Stops on the first page whose length differs from [`PAGE_SIZE`], or once
/// the offset reaches [`MAX_ITEM_OFFSET`]. Any page failure is returned.
pub async fn fetch_all_items(api: &dyn BoardApi, board_id: &str) -> BoardResult<Vec<BoardItem>> {
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let page = api.list_items(board_id, PAGE_SIZE, offset).await?;
        let full_page = page.len() == PAGE_SIZE as usize;
        items.extend(page);
        offset += PAGE_SIZE;

        if !full_page || offset >= MAX_ITEM_OFFSET {
            break;
        }
    }

    tracing::debug!(board_id, count = items.len(), "Fetched board items");
    Ok(items)
}
