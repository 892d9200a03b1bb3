use super::Document;
use super::state::new_id;
use crate::error::{Result, TreegridError};
use treegrid_engine::engine::{
    Column, ColumnKind, FormulaConfig, Node, ROOT_ID, Row, TimerValue, Value, ViewFilter,
    now_millis,
};

/// Direction for single-step column reordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Right,
}

/// Resolve a table node inside an arbitrary tree, checking its kind.
pub(crate) fn find_table<'a>(root: &'a Node, table_id: &str) -> Result<&'a Node> {
    let node = root
        .find(table_id)
        .ok_or_else(|| TreegridError::NodeNotFound(table_id.to_string()))?;
    if !node.is_table() {
        return Err(TreegridError::NotATable(table_id.to_string()));
    }
    Ok(node)
}

impl Document {
    fn table_mut(&mut self, table_id: &str) -> Result<&mut Node> {
        let node = self
            .root
            .find_mut(table_id)
            .ok_or_else(|| TreegridError::NodeNotFound(table_id.to_string()))?;
        if !node.is_table() {
            return Err(TreegridError::NotATable(table_id.to_string()));
        }
        Ok(node)
    }

    // --- nodes ---

    /// Add an empty folder under `parent_id`. Returns the new node's id.
    pub fn add_container(&mut self, parent_id: &str, name: &str) -> Result<String> {
        let id = new_id();
        self.attach_node(parent_id, Node::container(id.clone(), parent_id, name))?;
        Ok(id)
    }

    /// Add a table under `parent_id` with the default "Name" text column.
    /// Returns the new node's id.
    pub fn add_table(&mut self, parent_id: &str, name: &str) -> Result<String> {
        let id = new_id();
        let mut table = Node::table(id.clone(), parent_id, name);
        table
            .columns
            .push(Column::new(new_id(), "Name", ColumnKind::Text));
        self.attach_node(parent_id, table)?;
        Ok(id)
    }

    fn attach_node(&mut self, parent_id: &str, node: Node) -> Result<()> {
        let parent = self
            .root
            .find_mut(parent_id)
            .ok_or_else(|| TreegridError::NodeNotFound(parent_id.to_string()))?;
        if !parent.is_container() {
            return Err(TreegridError::NotAContainer(parent_id.to_string()));
        }
        parent.children.push(node);
        self.modified = true;
        Ok(())
    }

    pub fn rename_node(&mut self, id: &str, name: &str) -> Result<()> {
        let node = self
            .root
            .find_mut(id)
            .ok_or_else(|| TreegridError::NodeNotFound(id.to_string()))?;
        node.name = name.to_string();
        self.modified = true;
        Ok(())
    }

    /// Remove a node and its whole subtree.
    pub fn delete_node(&mut self, id: &str) -> Result<()> {
        if id == ROOT_ID {
            return Err(TreegridError::RootImmutable);
        }
        let parent = self
            .root
            .find_parent_mut(id)
            .ok_or_else(|| TreegridError::NodeNotFound(id.to_string()))?;
        parent.children.retain(|child| child.id != id);
        self.modified = true;
        Ok(())
    }

    /// Re-parent a node. The target must be a container outside the moved
    /// node's own subtree; this is checked before anything is detached.
    pub fn move_node(&mut self, id: &str, new_parent_id: &str) -> Result<()> {
        if id == ROOT_ID {
            return Err(TreegridError::RootImmutable);
        }
        let node = self
            .root
            .find(id)
            .ok_or_else(|| TreegridError::NodeNotFound(id.to_string()))?;
        if node.contains(new_parent_id) {
            return Err(TreegridError::MoveIntoDescendant {
                node: id.to_string(),
                target: new_parent_id.to_string(),
            });
        }
        let target = self
            .root
            .find(new_parent_id)
            .ok_or_else(|| TreegridError::NodeNotFound(new_parent_id.to_string()))?;
        if !target.is_container() {
            return Err(TreegridError::NotAContainer(new_parent_id.to_string()));
        }

        let parent = self
            .root
            .find_parent_mut(id)
            .ok_or_else(|| TreegridError::NodeNotFound(id.to_string()))?;
        let index = parent
            .children
            .iter()
            .position(|child| child.id == id)
            .ok_or_else(|| TreegridError::NodeNotFound(id.to_string()))?;
        let mut moved = parent.children.remove(index);
        moved.parent_id = Some(new_parent_id.to_string());

        let target = self
            .root
            .find_mut(new_parent_id)
            .ok_or_else(|| TreegridError::NodeNotFound(new_parent_id.to_string()))?;
        target.children.push(moved);
        self.modified = true;
        Ok(())
    }

    // --- columns ---

    /// Append a column. Returns the new column's id.
    pub fn add_column(&mut self, table_id: &str, name: &str, kind: ColumnKind) -> Result<String> {
        let id = new_id();
        let table = self.table_mut(table_id)?;
        table.columns.push(Column::new(id.clone(), name, kind));
        self.modified = true;
        Ok(id)
    }

    pub fn rename_column(&mut self, table_id: &str, column_id: &str, name: &str) -> Result<()> {
        let table = self.table_mut(table_id)?;
        let column = table
            .column_mut(column_id)
            .ok_or_else(|| TreegridError::ColumnNotFound(column_id.to_string()))?;
        column.name = name.to_string();
        self.modified = true;
        Ok(())
    }

    /// Remove a column. Row data keyed by the removed column is left in
    /// place and simply becomes unreachable.
    pub fn delete_column(&mut self, table_id: &str, column_id: &str) -> Result<()> {
        let table = self.table_mut(table_id)?;
        if table.column(column_id).is_none() {
            return Err(TreegridError::ColumnNotFound(column_id.to_string()));
        }
        table.columns.retain(|column| column.id != column_id);
        self.modified = true;
        Ok(())
    }

    /// Swap a column one step left or right. Already at the edge: no-op.
    /// Column order is evaluation order, so this can change formula results.
    pub fn move_column(
        &mut self,
        table_id: &str,
        column_id: &str,
        direction: MoveDirection,
    ) -> Result<()> {
        let table = self.table_mut(table_id)?;
        let index = table
            .columns
            .iter()
            .position(|column| column.id == column_id)
            .ok_or_else(|| TreegridError::ColumnNotFound(column_id.to_string()))?;
        match direction {
            MoveDirection::Left if index > 0 => table.columns.swap(index, index - 1),
            MoveDirection::Right if index + 1 < table.columns.len() => {
                table.columns.swap(index, index + 1)
            }
            _ => return Ok(()),
        }
        self.modified = true;
        Ok(())
    }

    /// Save a formula configuration onto a formula column, then re-sweep
    /// every row of the table (the new script can change every derived
    /// value).
    pub fn set_formula_config(
        &mut self,
        table_id: &str,
        column_id: &str,
        config: FormulaConfig,
    ) -> Result<()> {
        {
            let table = self.table_mut(table_id)?;
            let column = table
                .column_mut(column_id)
                .ok_or_else(|| TreegridError::ColumnNotFound(column_id.to_string()))?;
            if !column.kind.is_formula() {
                return Err(TreegridError::NotAFormulaColumn(column_id.to_string()));
            }
            column.formula = Some(config);
        }
        self.modified = true;
        self.recalculate_table(table_id)
    }

    // --- rows ---

    /// Append an empty row. Returns the new row's id.
    pub fn add_row(&mut self, table_id: &str) -> Result<String> {
        let id = new_id();
        let table = self.table_mut(table_id)?;
        table.rows.push(Row::new(id.clone()));
        self.modified = true;
        Ok(id)
    }

    pub fn delete_row(&mut self, table_id: &str, row_id: &str) -> Result<()> {
        let table = self.table_mut(table_id)?;
        if table.row(row_id).is_none() {
            return Err(TreegridError::RowNotFound(row_id.to_string()));
        }
        table.rows.retain(|row| row.id != row_id);
        self.modified = true;
        Ok(())
    }

    /// Write one cell, then re-run the edited row's auto-formulas.
    pub fn set_cell(
        &mut self,
        table_id: &str,
        row_id: &str,
        column_id: &str,
        value: Value,
    ) -> Result<()> {
        {
            let table = self.table_mut(table_id)?;
            if table.column(column_id).is_none() {
                return Err(TreegridError::ColumnNotFound(column_id.to_string()));
            }
            let row = table
                .row_mut(row_id)
                .ok_or_else(|| TreegridError::RowNotFound(row_id.to_string()))?;
            row.data.insert(column_id.to_string(), value);
        }
        self.modified = true;
        self.recalculate_row(table_id, row_id)
    }

    /// Flip a timer cell between running and stopped at an explicit clock
    /// reading, then treat it as an ordinary cell edit.
    pub fn toggle_timer_at(
        &mut self,
        table_id: &str,
        row_id: &str,
        column_id: &str,
        now_millis: i64,
    ) -> Result<()> {
        let mut timer = {
            let table = find_table(&self.root, table_id)?;
            let column = table
                .column(column_id)
                .ok_or_else(|| TreegridError::ColumnNotFound(column_id.to_string()))?;
            if column.kind != ColumnKind::Timer {
                return Err(TreegridError::NotATimerColumn(column_id.to_string()));
            }
            let row = table
                .row(row_id)
                .ok_or_else(|| TreegridError::RowNotFound(row_id.to_string()))?;
            match row.data.get(column_id) {
                Some(Value::Timer(timer)) => *timer,
                _ => TimerValue::default(),
            }
        };
        timer.toggle_at(now_millis);
        self.set_cell(table_id, row_id, column_id, Value::Timer(timer))
    }

    /// Flip a timer cell against the system clock.
    pub fn toggle_timer(&mut self, table_id: &str, row_id: &str, column_id: &str) -> Result<()> {
        self.toggle_timer_at(table_id, row_id, column_id, now_millis())
    }

    // --- views ---

    /// Add an empty saved view. Returns the new view's id.
    pub fn add_view(&mut self, table_id: &str, name: &str) -> Result<String> {
        let id = new_id();
        let table = self.table_mut(table_id)?;
        table.views.push(ViewFilter {
            id: id.clone(),
            name: name.to_string(),
            conditions: Vec::new(),
        });
        self.modified = true;
        Ok(id)
    }

    /// Replace a view (matched by id) with an edited copy.
    pub fn update_view(&mut self, table_id: &str, view: ViewFilter) -> Result<()> {
        let table = self.table_mut(table_id)?;
        let slot = table
            .views
            .iter_mut()
            .find(|existing| existing.id == view.id)
            .ok_or_else(|| TreegridError::ViewNotFound(view.id.clone()))?;
        *slot = view;
        self.modified = true;
        Ok(())
    }

    pub fn delete_view(&mut self, table_id: &str, view_id: &str) -> Result<()> {
        let table = self.table_mut(table_id)?;
        if !table.views.iter().any(|view| view.id == view_id) {
            return Err(TreegridError::ViewNotFound(view_id.to_string()));
        }
        table.views.retain(|view| view.id != view_id);
        self.modified = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_folder_and_table() -> (Document, String, String) {
        let mut doc = Document::new();
        let folder_id = doc.add_container(ROOT_ID, "Projects").unwrap();
        let table_id = doc.add_table(&folder_id, "Tasks").unwrap();
        (doc, folder_id, table_id)
    }

    #[test]
    fn test_add_table_gets_default_name_column() {
        let (doc, _, table_id) = doc_with_folder_and_table();
        let table = doc.root.find(&table_id).unwrap();
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].name, "Name");
        assert_eq!(table.columns[0].kind, ColumnKind::Text);
    }

    #[test]
    fn test_delete_node_removes_subtree() {
        let (mut doc, folder_id, table_id) = doc_with_folder_and_table();
        doc.delete_node(&folder_id).unwrap();
        assert!(doc.root.find(&folder_id).is_none());
        assert!(doc.root.find(&table_id).is_none());
    }

    #[test]
    fn test_delete_root_is_rejected() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.delete_node(ROOT_ID),
            Err(TreegridError::RootImmutable)
        ));
    }

    #[test]
    fn test_move_node_reparents_and_keeps_ids() {
        let (mut doc, folder_id, table_id) = doc_with_folder_and_table();
        let other_id = doc.add_container(ROOT_ID, "Archive").unwrap();

        doc.move_node(&table_id, &other_id).unwrap();

        let table = doc.root.find(&table_id).unwrap();
        assert_eq!(table.parent_id.as_deref(), Some(other_id.as_str()));
        assert!(doc.root.find(&folder_id).unwrap().children.is_empty());
    }

    #[test]
    fn test_move_into_own_descendant_is_rejected_without_mutation() {
        let (mut doc, folder_id, _) = doc_with_folder_and_table();
        let inner_id = doc.add_container(&folder_id, "Inner").unwrap();

        let before = doc.root.clone();
        let result = doc.move_node(&folder_id, &inner_id);
        assert!(matches!(
            result,
            Err(TreegridError::MoveIntoDescendant { .. })
        ));
        assert_eq!(doc.root, before);
    }

    #[test]
    fn test_move_into_self_is_rejected() {
        let (mut doc, folder_id, _) = doc_with_folder_and_table();
        assert!(matches!(
            doc.move_node(&folder_id, &folder_id),
            Err(TreegridError::MoveIntoDescendant { .. })
        ));
    }

    #[test]
    fn test_move_column_swaps_neighbors_and_stops_at_edges() {
        let (mut doc, _, table_id) = doc_with_folder_and_table();
        let second = doc
            .add_column(&table_id, "Score", ColumnKind::Number)
            .unwrap();

        doc.move_column(&table_id, &second, MoveDirection::Left).unwrap();
        let table = doc.root.find(&table_id).unwrap();
        assert_eq!(table.columns[0].id, second);

        doc.move_column(&table_id, &second, MoveDirection::Left).unwrap();
        let table = doc.root.find(&table_id).unwrap();
        assert_eq!(table.columns[0].id, second);
    }

    #[test]
    fn test_set_cell_rejects_unknown_column() {
        let (mut doc, _, table_id) = doc_with_folder_and_table();
        let row_id = doc.add_row(&table_id).unwrap();
        assert!(matches!(
            doc.set_cell(&table_id, &row_id, "nope", Value::from("x")),
            Err(TreegridError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_toggle_timer_starts_then_stops() {
        let (mut doc, _, table_id) = doc_with_folder_and_table();
        let timer_col = doc.add_column(&table_id, "Time", ColumnKind::Timer).unwrap();
        let row_id = doc.add_row(&table_id).unwrap();
        let t0 = 1_700_000_000_000;

        doc.toggle_timer_at(&table_id, &row_id, &timer_col, t0).unwrap();
        let table = doc.root.find(&table_id).unwrap();
        match table.row(&row_id).unwrap().data.get(&timer_col) {
            Some(Value::Timer(timer)) => {
                assert_eq!(timer.run_start_epoch_millis, Some(t0));
                assert_eq!(timer.accumulated_seconds, 0);
            }
            other => panic!("expected a timer, got {:?}", other),
        }

        doc.toggle_timer_at(&table_id, &row_id, &timer_col, t0 + 5_000)
            .unwrap();
        let table = doc.root.find(&table_id).unwrap();
        match table.row(&row_id).unwrap().data.get(&timer_col) {
            Some(Value::Timer(timer)) => {
                assert!(!timer.is_running());
                assert_eq!(timer.accumulated_seconds, 5);
            }
            other => panic!("expected a timer, got {:?}", other),
        }
    }

    #[test]
    fn test_toggle_timer_on_text_column_is_rejected() {
        let (mut doc, _, table_id) = doc_with_folder_and_table();
        let table = doc.root.find(&table_id).unwrap();
        let name_col = table.columns[0].id.clone();
        let row_id = doc.add_row(&table_id).unwrap();
        assert!(matches!(
            doc.toggle_timer(&table_id, &row_id, &name_col),
            Err(TreegridError::NotATimerColumn(_))
        ));
    }

    #[test]
    fn test_view_crud() {
        let (mut doc, _, table_id) = doc_with_folder_and_table();
        let view_id = doc.add_view(&table_id, "Open items").unwrap();

        let mut view = doc
            .root
            .find(&table_id)
            .unwrap()
            .views
            .iter()
            .find(|view| view.id == view_id)
            .unwrap()
            .clone();
        view.name = "Everything".to_string();
        doc.update_view(&table_id, view).unwrap();
        assert_eq!(doc.root.find(&table_id).unwrap().views[0].name, "Everything");

        doc.delete_view(&table_id, &view_id).unwrap();
        assert!(doc.root.find(&table_id).unwrap().views.is_empty());
    }
}
