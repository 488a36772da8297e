//! Column descriptors
//!
//! Every listable resource publishes a fixed set of columns. The descriptors
//! are what the admin table renders; the SQL expression behind each key never
//! leaves the server and is never taken from a request.

use serde::Serialize;

use super::filter::FilterOperator;
use super::ListingError;

/// Filter widget type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Text,
    Number,
    Date,
    Boolean,
    Select,
}

impl FilterKind {
    /// Operators a column of this kind accepts
    pub fn operators(self) -> &'static [FilterOperator] {
        use FilterOperator::*;
        match self {
            FilterKind::Text => &[
                Contains, StartsWith, EndsWith, Equals, NotEquals, Empty, NotEmpty,
            ],
            FilterKind::Number => &[Eq, Neq, Gt, Gte, Lt, Lte, Between, In],
            FilterKind::Date => &[On, Before, After, Between],
            FilterKind::Boolean => &[IsTrue, IsFalse, IsNull, IsNotNull],
            FilterKind::Select => &[Eq, Neq],
        }
    }
}

/// How filter values for a column are parsed and bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Date,
    Boolean,
}

/// One entry of a select filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: serde_json::Value,
}

/// Filter configuration attached to a column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFilter {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub operators: Vec<FilterOperator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip)]
    pub value_type: ValueType,
}

impl ColumnFilter {
    pub fn new(kind: FilterKind) -> Self {
        let value_type = match kind {
            FilterKind::Text => ValueType::Text,
            FilterKind::Number => ValueType::Integer,
            FilterKind::Date => ValueType::Date,
            FilterKind::Boolean => ValueType::Boolean,
            FilterKind::Select => ValueType::Text,
        };
        Self {
            kind,
            operators: kind.operators().to_vec(),
            options: Vec::new(),
            value_type,
        }
    }

    /// Select filter whose option values are of `value_type`
    pub fn select(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Self::new(FilterKind::Select)
        }
    }

    /// Restrict the accepted operators to a subset
    pub fn with_operators(mut self, operators: &[FilterOperator]) -> Self {
        self.operators = operators
            .iter()
            .copied()
            .filter(|op| self.kind.operators().contains(op))
            .collect();
        self
    }

    pub fn allows(&self, operator: FilterOperator) -> bool {
        self.operators.contains(&operator)
    }
}

/// Configuration of a single table column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub show: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ColumnFilter>,
    /// SQL expression the key maps to
    #[serde(skip)]
    pub expr: &'static str,
}

impl ColumnDescriptor {
    pub fn new(key: &'static str, label: &'static str, expr: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
            show: true,
            filter: None,
            expr,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.show = false;
        self
    }

    pub fn filter(mut self, filter: ColumnFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Ordered set of columns for one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn require(&self, key: &str) -> Result<&ColumnDescriptor, ListingError> {
        self.get(key)
            .ok_or_else(|| ListingError::UnknownColumn(key.to_string()))
    }

    fn position(&self, key: &str) -> Result<usize, ListingError> {
        self.columns
            .iter()
            .position(|c| c.key == key)
            .ok_or_else(|| ListingError::UnknownColumn(key.to_string()))
    }

    /// Visible columns in display order
    pub fn visible(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.show)
    }

    /// Flip the visibility of one column
    pub fn toggle(&mut self, key: &str) -> Result<(), ListingError> {
        let index = self.position(key)?;
        self.columns[index].show = !self.columns[index].show;
        Ok(())
    }

    /// Move `dragged` to the slot `target` occupied before the move.
    pub fn move_before(&mut self, dragged: &str, target: &str) -> Result<(), ListingError> {
        let from = self.position(dragged)?;
        let to = self.position(target)?;
        if from == to {
            return Ok(());
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        Ok(())
    }

    /// Show exactly `keys`, in that order, followed by the remaining
    /// columns hidden in their current order.
    pub fn apply_layout<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<(), ListingError> {
        if keys.is_empty() {
            return Ok(());
        }

        for (slot, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            let index = self.position(key)?;
            if index < slot {
                return Err(ListingError::DuplicateColumn(key.to_string()));
            }
            let target = self.columns[slot].key;
            if index != slot {
                self.move_before(key, target)?;
            }
            self.columns[slot].show = true;
        }

        for column in self.columns.iter_mut().skip(keys.len()) {
            column.show = false;
        }

        Ok(())
    }

    /// Replace the options of a select column
    pub fn set_options(
        &mut self,
        key: &str,
        options: Vec<SelectOption>,
    ) -> Result<(), ListingError> {
        let index = self.position(key)?;
        match self.columns[index].filter.as_mut() {
            Some(filter) if filter.kind == FilterKind::Select => {
                filter.options = options;
                Ok(())
            }
            _ => Err(ListingError::NotFilterable(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ColumnSet {
        ColumnSet::new(vec![
            ColumnDescriptor::new("id", "ID", "u.id").sortable(),
            ColumnDescriptor::new("name", "Name", "u.name")
                .sortable()
                .filter(ColumnFilter::new(FilterKind::Text)),
            ColumnDescriptor::new("email", "Email", "u.email"),
            ColumnDescriptor::new("created_at", "Created", "u.created_at").hidden(),
        ])
    }

    fn keys(set: &ColumnSet) -> Vec<&'static str> {
        set.descriptors().iter().map(|c| c.key).collect()
    }

    #[test]
    fn test_toggle() {
        let mut set = columns();
        set.toggle("email").unwrap();
        assert!(!set.get("email").unwrap().show);
        set.toggle("email").unwrap();
        assert!(set.get("email").unwrap().show);
        assert!(set.toggle("nope").is_err());
    }

    #[test]
    fn test_move_before_forward_and_backward() {
        let mut set = columns();
        set.move_before("id", "email").unwrap();
        assert_eq!(keys(&set), ["name", "email", "id", "created_at"]);

        set.move_before("created_at", "name").unwrap();
        assert_eq!(keys(&set), ["created_at", "name", "email", "id"]);

        // Same key is a no-op
        set.move_before("name", "name").unwrap();
        assert_eq!(keys(&set), ["created_at", "name", "email", "id"]);
    }

    #[test]
    fn test_apply_layout() {
        let mut set = columns();
        set.apply_layout(&["email", "created_at"]).unwrap();

        assert_eq!(keys(&set), ["email", "created_at", "id", "name"]);
        let visible: Vec<_> = set.visible().map(|c| c.key).collect();
        assert_eq!(visible, ["email", "created_at"]);
    }

    #[test]
    fn test_apply_layout_rejects_duplicates_and_unknown() {
        let mut set = columns();
        assert!(matches!(
            set.apply_layout(&["name", "name"]),
            Err(ListingError::DuplicateColumn(_))
        ));

        let mut set = columns();
        assert!(matches!(
            set.apply_layout(&["ghost"]),
            Err(ListingError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_empty_layout_keeps_defaults() {
        let mut set = columns();
        set.apply_layout::<&str>(&[]).unwrap();
        assert_eq!(set, columns());
    }

    #[test]
    fn test_descriptor_serialization_hides_expr() {
        let json = serde_json::to_value(columns()).unwrap();
        let name = &json[1];

        assert_eq!(name["key"], "name");
        assert_eq!(name["filter"]["type"], "text");
        assert_eq!(name["filter"]["operators"][1], "startsWith");
        assert!(name.get("expr").is_none());
        assert!(json[0].get("filter").is_none());
    }

    #[test]
    fn test_with_operators_keeps_only_valid_ones() {
        let filter = ColumnFilter::new(FilterKind::Select)
            .with_operators(&[FilterOperator::Eq, FilterOperator::Contains]);
        assert_eq!(filter.operators, vec![FilterOperator::Eq]);
    }
}
