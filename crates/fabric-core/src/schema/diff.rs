use super::Column;

/// Column-level differences between an existing relation and a freshly staged one.
#[derive(Debug)]
pub struct ColumnsDiff<'a> {
    items: Vec<ColumnsDiffItem<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnsDiffItem<'a> {
    /// Present in the staged relation only.
    AddColumn(&'a Column),

    /// Present in the existing relation only.
    DropColumn(&'a Column),

    /// Present in both with a different data type.
    AlterColumn {
        previous: &'a Column,
        next: &'a Column,
    },
}

impl<'a> ColumnsDiff<'a> {
    /// Compares columns by exact name. Items follow `previous` order for drops
    /// and type changes, then `next` order for additions.
    pub fn from(previous: &'a [Column], next: &'a [Column]) -> ColumnsDiff<'a> {
        let mut items = vec![];

        for column in previous {
            match next.iter().find(|candidate| candidate.name == column.name) {
                None => items.push(ColumnsDiffItem::DropColumn(column)),
                Some(candidate) if !column.same_type(candidate) => {
                    items.push(ColumnsDiffItem::AlterColumn {
                        previous: column,
                        next: candidate,
                    })
                }
                Some(_) => {}
            }
        }

        for column in next {
            if !previous.iter().any(|existing| existing.name == column.name) {
                items.push(ColumnsDiffItem::AddColumn(column));
            }
        }

        ColumnsDiff { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnsDiffItem<'a>> {
        self.items.iter()
    }

    pub fn added(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.items.iter().filter_map(|item| match item {
            ColumnsDiffItem::AddColumn(column) => Some(*column),
            _ => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = &'a Column> + '_ {
        self.items.iter().filter_map(|item| match item {
            ColumnsDiffItem::DropColumn(column) => Some(*column),
            _ => None,
        })
    }

    /// Columns whose type changed, as `(previous, next)`.
    pub fn altered(&self) -> impl Iterator<Item = (&'a Column, &'a Column)> + '_ {
        self.items.iter().filter_map(|item| match item {
            ColumnsDiffItem::AlterColumn { previous, next } => Some((*previous, *next)),
            _ => None,
        })
    }

    /// Human readable summary used in drift errors and logs.
    pub fn summary(&self) -> String {
        let added = self.added().map(|c| c.name.as_str()).collect::<Vec<_>>();
        let removed = self.removed().map(|c| c.name.as_str()).collect::<Vec<_>>();
        let altered = self
            .altered()
            .map(|(previous, next)| {
                format!("{} ({} -> {})", next.name, previous.data_type(), next.data_type())
            })
            .collect::<Vec<_>>();

        let mut parts = vec![];
        if !added.is_empty() {
            parts.push(format!("added [{}]", added.join(", ")));
        }
        if !removed.is_empty() {
            parts.push(format!("removed [{}]", removed.join(", ")));
        }
        if !altered.is_empty() {
            parts.push(format!("changed [{}]", altered.join(", ")));
        }

        if parts.is_empty() {
            "no column changes".to_string()
        } else {
            parts.join("; ")
        }
    }
}
