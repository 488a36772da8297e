//! Column sets published by each listable resource

use crate::listing::{ColumnDescriptor, ColumnFilter, ColumnSet, FilterKind, FilterOperator, ValueType};

/// Id filter offers the admin table's id operators. `neq` and `between`
/// stay out, so no published column accepts them for numbers.
fn id_column(expr: &'static str) -> ColumnDescriptor {
    use FilterOperator::*;
    ColumnDescriptor::new("id", "Id", expr)
        .sortable()
        .filter(ColumnFilter::new(FilterKind::Number).with_operators(&[Eq, Gt, Gte, Lt, Lte, In]))
}

fn text_column(key: &'static str, label: &'static str, expr: &'static str) -> ColumnDescriptor {
    ColumnDescriptor::new(key, label, expr)
        .sortable()
        .filter(ColumnFilter::new(FilterKind::Text))
}

fn date_column(key: &'static str, label: &'static str, expr: &'static str) -> ColumnDescriptor {
    ColumnDescriptor::new(key, label, expr)
        .sortable()
        .filter(ColumnFilter::new(FilterKind::Date))
}

/// Users, queried as `users u JOIN roles r`
pub fn user_columns() -> ColumnSet {
    ColumnSet::new(vec![
        id_column("u.id"),
        text_column("name", "Name", "u.name"),
        text_column("email", "Email", "u.email"),
        text_column("vsc_account", "VSC Account", "u.vsc_account"),
        text_column("role", "Role", "r.name"),
        ColumnDescriptor::new("role_id", "Role Id", "u.role_id")
            .hidden()
            .filter(ColumnFilter::select(ValueType::Integer)),
        date_column("created_at", "Created At", "u.created_at"),
        date_column("updated_at", "Updated At", "u.updated_at"),
    ])
}

/// Roles, queried as `roles r`
pub fn role_columns() -> ColumnSet {
    ColumnSet::new(vec![
        id_column("r.id"),
        text_column("name", "Name", "r.name"),
        date_column("created_at", "Created At", "r.created_at"),
        date_column("updated_at", "Updated At", "r.updated_at"),
    ])
}

/// Tenants, queried as `tenants t`
pub fn tenant_columns() -> ColumnSet {
    ColumnSet::new(vec![
        id_column("t.id"),
        text_column("name", "Name", "t.name"),
        date_column("created_at", "Created At", "t.created_at"),
        date_column("updated_at", "Updated At", "t.updated_at").hidden(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        for set in [user_columns(), role_columns(), tenant_columns()] {
            let mut keys: Vec<_> = set.descriptors().iter().map(|c| c.key).collect();
            let total = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), total);
        }
    }

    #[test]
    fn test_user_role_columns() {
        let users = user_columns();
        assert!(users.get("role_id").unwrap().filter.is_some());
        assert!(!users.get("role_id").unwrap().show);
        assert!(users.get("role").unwrap().sortable);
    }

    #[test]
    fn test_id_column_operators() {
        for columns in [user_columns(), role_columns(), tenant_columns()] {
            let filter = columns.get("id").unwrap().filter.clone().unwrap();
            assert!(!filter.allows(FilterOperator::Between));
            assert!(!filter.allows(FilterOperator::Neq));
            assert!(filter.allows(FilterOperator::In));
        }
    }
}
