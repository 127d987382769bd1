//! Sort keys and tie-break policies.
//!
//! The filter endpoint sorts by one allow-listed column and adds no
//! tie-break, so its order is only stable when that column is unique. Saved
//! view apply always appends `id ASC`.

/// Sortable task columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    Description,
    Status,
    Priority,
    DueDate,
    ListId,
    ParentTaskId,
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    pub fn sql(&self) -> &'static str {
        match self {
            SortColumn::Id => "t.id",
            SortColumn::Name => "t.name",
            SortColumn::Description => "t.description",
            SortColumn::Status => "t.status",
            SortColumn::Priority => "t.priority",
            SortColumn::DueDate => "t.due_date",
            SortColumn::ListId => "t.list_id",
            SortColumn::ParentTaskId => "t.parent_task_id",
            SortColumn::CreatedAt => "t.created_at",
            SortColumn::UpdatedAt => "t.updated_at",
        }
    }

    /// Columns accepted by the filter endpoint's `sort` parameter.
    pub fn from_filter_param(name: &str) -> Option<Self> {
        match name.trim() {
            "created_at" => Some(SortColumn::CreatedAt),
            "due_date" => Some(SortColumn::DueDate),
            "priority" => Some(SortColumn::Priority),
            "name" => Some(SortColumn::Name),
            "status" => Some(SortColumn::Status),
            _ => None,
        }
    }

    /// Any task column, as named in a saved view's sort spec.
    pub fn from_task_field(name: &str) -> Option<Self> {
        match name.trim() {
            "id" => Some(SortColumn::Id),
            "name" => Some(SortColumn::Name),
            "description" => Some(SortColumn::Description),
            "status" => Some(SortColumn::Status),
            "priority" => Some(SortColumn::Priority),
            "due_date" => Some(SortColumn::DueDate),
            "list_id" => Some(SortColumn::ListId),
            "parent_task_id" => Some(SortColumn::ParentTaskId),
            "created_at" => Some(SortColumn::CreatedAt),
            "updated_at" => Some(SortColumn::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    /// `desc` (any case) is descending, everything else ascending.
    fn lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: Direction,
}

impl SortKey {
    pub fn new(column: SortColumn, direction: Direction) -> Self {
        Self { column, direction }
    }
}

/// What to order by after the requested keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Ties fall in storage order.
    None,
    /// Append `id ASC` unless the keys already order by id.
    IdAscending,
}

/// Sort for the filter endpoint's `sort`/`order` query parameters.
///
/// An unknown or missing column falls back to `created_at DESC`; the
/// direction defaults to descending.
pub fn filter_sort(sort: Option<&str>, order: Option<&str>) -> SortKey {
    match sort.and_then(SortColumn::from_filter_param) {
        Some(column) => {
            let direction = match order.map(|o| o.trim().to_ascii_lowercase()) {
                Some(ref o) if o == "asc" => Direction::Asc,
                _ => Direction::Desc,
            };
            SortKey::new(column, direction)
        }
        None => SortKey::new(SortColumn::CreatedAt, Direction::Desc),
    }
}

/// Parse a saved view sort spec such as `status:desc,name`.
///
/// A token without a direction sorts ascending. An absent or empty spec falls
/// back to `name:asc,id:asc`. Unknown columns are skipped.
pub fn parse_view_sort(spec: Option<&str>) -> Vec<SortKey> {
    let mut pairs: Vec<(&str, Direction)> = spec
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once(':') {
            Some((field, dir)) => (field.trim(), Direction::lenient(dir)),
            None => (token, Direction::Asc),
        })
        .collect();
    if pairs.is_empty() {
        pairs = vec![("name", Direction::Asc), ("id", Direction::Asc)];
    }
    pairs
        .into_iter()
        .filter_map(|(field, direction)| {
            SortColumn::from_task_field(field).map(|column| SortKey::new(column, direction))
        })
        .collect()
}

/// `ORDER BY ...` for the keys and tie-break policy. Empty when there is
/// nothing to order by.
pub fn order_by_sql(keys: &[SortKey], tie_break: TieBreak) -> String {
    let mut terms: Vec<String> = keys
        .iter()
        .map(|k| format!("{} {}", k.column.sql(), k.direction.sql()))
        .collect();
    if tie_break == TieBreak::IdAscending && !keys.iter().any(|k| k.column == SortColumn::Id) {
        terms.push(format!("{} ASC", SortColumn::Id.sql()));
    }
    if terms.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", terms.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_sort_allow_list() {
        assert_eq!(
            filter_sort(Some("name"), Some("asc")),
            SortKey::new(SortColumn::Name, Direction::Asc)
        );
        assert_eq!(
            filter_sort(Some("due_date"), None),
            SortKey::new(SortColumn::DueDate, Direction::Desc)
        );
        assert_eq!(
            filter_sort(Some("priority"), Some("sideways")),
            SortKey::new(SortColumn::Priority, Direction::Desc)
        );
    }

    #[test]
    fn filter_sort_falls_back_to_created_desc() {
        let fallback = SortKey::new(SortColumn::CreatedAt, Direction::Desc);
        assert_eq!(filter_sort(None, None), fallback);
        assert_eq!(filter_sort(Some("id"), Some("asc")), fallback);
        assert_eq!(filter_sort(Some("description"), Some("asc")), fallback);
    }

    #[test]
    fn view_sort_parsing() {
        assert_eq!(
            parse_view_sort(Some("status:desc, name")),
            vec![
                SortKey::new(SortColumn::Status, Direction::Desc),
                SortKey::new(SortColumn::Name, Direction::Asc),
            ]
        );
        assert_eq!(
            parse_view_sort(Some("name:DESC")),
            vec![SortKey::new(SortColumn::Name, Direction::Desc)]
        );
        assert_eq!(
            parse_view_sort(Some("name:upward")),
            vec![SortKey::new(SortColumn::Name, Direction::Asc)]
        );
    }

    #[test]
    fn view_sort_fallback_and_unknown_columns() {
        let fallback = vec![
            SortKey::new(SortColumn::Name, Direction::Asc),
            SortKey::new(SortColumn::Id, Direction::Asc),
        ];
        assert_eq!(parse_view_sort(None), fallback);
        assert_eq!(parse_view_sort(Some(" , ")), fallback);
        assert!(parse_view_sort(Some("colour:desc")).is_empty());
    }

    #[test]
    fn order_by_applies_tie_break_policy() {
        let keys = [SortKey::new(SortColumn::Status, Direction::Desc)];
        assert_eq!(
            order_by_sql(&keys, TieBreak::None),
            " ORDER BY t.status DESC"
        );
        assert_eq!(
            order_by_sql(&keys, TieBreak::IdAscending),
            " ORDER BY t.status DESC, t.id ASC"
        );

        let with_id = [SortKey::new(SortColumn::Id, Direction::Desc)];
        assert_eq!(
            order_by_sql(&with_id, TieBreak::IdAscending),
            " ORDER BY t.id DESC"
        );
        assert_eq!(order_by_sql(&[], TieBreak::IdAscending), " ORDER BY t.id ASC");
        assert_eq!(order_by_sql(&[], TieBreak::None), "");
    }
}
