use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    TaskName,
    AssignedTo,
    Room,
    Frequency,
    Description,
    Status,
    DueDate,
    CreatedAt,
    CompletedAt,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::TaskName => "task_name",
            Self::AssignedTo => "assigned_to",
            Self::Room => "room",
            Self::Frequency => "frequency",
            Self::Description => "description",
            Self::Status => "status",
            Self::DueDate => "due_date",
            Self::CreatedAt => "created_at",
            Self::CompletedAt => "completed_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
}

impl FilterOp {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gte => "gte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: Column,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq<V: Into<String>>(column: Column, value: V) -> Self {
        Self {
            column,
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte<V: Into<String>>(column: Column, value: V) -> Self {
        Self {
            column,
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    /// PostgREST query parameter, e.g. `("status", "eq.pending")`.
    pub fn to_param(&self) -> (String, String) {
        (
            self.column.name().to_string(),
            format!("{}.{}", self.op.keyword(), self.value),
        )
    }

    /// Evaluates the filter against a serialized row. NULL never matches.
    pub fn matches(&self, row: &Value) -> bool {
        let Some(cell) = row.get(self.column.name()).and_then(SortKey::from_value) else {
            return false;
        };
        let wanted = SortKey::parse_like(&cell, &self.value);
        match self.op {
            FilterOp::Eq => cell == wanted,
            FilterOp::Gte => cell >= wanted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: Column,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            descending: true,
        }
    }

    pub fn to_param(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{}.{}", self.column.name(), direction)
    }

    /// PostgreSQL ordering: NULLs sort last ascending and first descending.
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        let left = left.get(self.column.name()).and_then(SortKey::from_value);
        let right = right.get(self.column.name()).and_then(SortKey::from_value);
        let ascending = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => left.cmp(&right),
        };
        if self.descending {
            ascending.reverse()
        } else {
            ascending
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl TaskQuery {
    /// Every row, newest created first.
    pub fn all() -> Self {
        Self::default().order_by(Order::desc(Column::CreatedAt))
    }

    pub fn by_id(id: i64) -> Self {
        Self::default()
            .filter(Filter::eq(Column::Id, id.to_string()))
            .limit(1)
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.to_param()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(i64),
    Text(String),
}

impl SortKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => number.as_i64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }

    fn parse_like(cell: &Self, raw: &str) -> Self {
        match cell {
            Self::Number(_) => raw
                .trim()
                .parse::<i64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            Self::Text(_) => Self::Text(raw.to_string()),
        }
    }
}
