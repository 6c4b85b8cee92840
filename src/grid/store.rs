// src/grid/store.rs
//! Materialized rows of one grid instance.

use std::collections::HashMap;

use crate::grid::definitions::Row;
use crate::grid::service::PageResult;
use crate::grid::virtualizer::RowWindow;

#[derive(Debug, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    index: HashMap<String, usize>,
    total_count: usize,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends (skipping ids already held) or replaces. Returns the number of rows now held.
    pub fn apply_page(&mut self, page: PageResult, append: bool) -> usize {
        if append && !self.rows.is_empty() {
            for row in page.rows {
                if self.index.contains_key(&row.id) {
                    continue;
                }
                self.index.insert(row.id.clone(), self.rows.len());
                self.rows.push(row);
            }
        } else {
            self.rows = page.rows;
            self.rebuild_index();
        }
        self.total_count = page.total_count.max(self.rows.len());
        self.rows.len()
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.id.clone(), i))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn has_more(&self) -> bool {
        self.rows.len() < self.total_count
    }

    /// Index of the page that continues the held rows.
    pub fn next_page_index(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.rows.len() / page_size
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, id: &str) -> Option<&Row> {
        self.index.get(id).and_then(|&i| self.rows.get(i))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Row> {
        match self.index.get(id) {
            Some(&i) => self.rows.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Removes the given ids and returns the rows that were actually held.
    pub fn remove_ids(&mut self, ids: &[String]) -> Vec<Row> {
        let (removed, kept): (Vec<Row>, Vec<Row>) = std::mem::take(&mut self.rows)
            .into_iter()
            .partition(|row| ids.contains(&row.id));
        self.rows = kept;
        self.rebuild_index();
        self.total_count = self.total_count.saturating_sub(removed.len());
        removed
    }

    pub fn slice(&self, window: RowWindow) -> &[Row] {
        let end = window.end.min(self.rows.len());
        let start = window.start.min(end);
        &self.rows[start..end]
    }

}
