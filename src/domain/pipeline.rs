//! Aggregation pipelines over documents.
//!
//! Stores run a leading [`Stage::Match`] natively and evaluate the remaining
//! stages in process with [`Pipeline::run`].

use chrono::{DateTime, Datelike};
use serde_json::{Map, Value};

use crate::domain::document::FieldPath;
use crate::domain::query::{Filter, Projection, SortKey, compare_documents, compare_values};

#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// A single group over every input document.
    All,
    Field(FieldPath),
    /// Calendar month (1-12) of an RFC 3339 timestamp field.
    Month(FieldPath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Count,
    Sum(FieldPath),
    Avg(FieldPath),
    Min(FieldPath),
    Max(FieldPath),
    Push(FieldPath),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    /// Output field holding the group key. Ignored for [`GroupKey::All`].
    pub key_as: String,
    pub fields: Vec<(String, Accumulator)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    /// Emits one document per element of an array field. Documents whose
    /// field is missing or empty are dropped.
    Unwind(FieldPath),
    Group(Group),
    Sort(Vec<SortKey>),
    Project(Projection),
    Limit(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Restricts the input documents to `filter`, merging it into an
    /// existing leading match.
    pub fn with_leading_match(mut self, filter: Filter) -> Self {
        if filter.is_empty() {
            return self;
        }
        match self.stages.first_mut() {
            Some(Stage::Match(existing)) => {
                *existing = filter.and(std::mem::take(existing));
            }
            _ => self.stages.insert(0, Stage::Match(filter)),
        }
        self
    }

    /// Splits off a leading match so a store can evaluate it natively.
    pub fn split_leading_match(&self) -> (Option<&Filter>, &[Stage]) {
        match self.stages.split_first() {
            Some((Stage::Match(filter), rest)) => (Some(filter), rest),
            _ => (None, &self.stages),
        }
    }

    pub fn run(&self, docs: Vec<Value>) -> Vec<Value> {
        run_stages(&self.stages, docs)
    }
}

/// Evaluates `stages` in order over `docs`.
pub fn run_stages(stages: &[Stage], docs: Vec<Value>) -> Vec<Value> {
    stages.iter().fold(docs, |docs, stage| match stage {
        Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
        Stage::Unwind(field) => unwind(docs, field),
        Stage::Group(group) => group_documents(docs, group),
        Stage::Sort(keys) => {
            let mut docs = docs;
            docs.sort_by(|a, b| compare_documents(a, b, keys));
            docs
        }
        Stage::Project(projection) => docs.into_iter().map(|d| projection.apply(d)).collect(),
        Stage::Limit(n) => docs.into_iter().take(*n).collect(),
    })
}

fn unwind(docs: Vec<Value>, field: &FieldPath) -> Vec<Value> {
    let Some(last) = field.segments().last() else {
        return docs;
    };
    let parent = FieldPath::new(&field.segments()[..field.segments().len() - 1].join("."));

    let mut out = Vec::new();
    for doc in docs {
        let Some(Value::Array(items)) = field.resolve(&doc).cloned() else {
            continue;
        };
        for item in items {
            let mut copy = doc.clone();
            if let Some(Value::Object(map)) = resolve_mut(&mut copy, &parent) {
                map.insert(last.clone(), item);
            }
            out.push(copy);
        }
    }
    out
}

fn resolve_mut<'a>(doc: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(doc, |current, segment| current.get_mut(segment.as_str()))
}

fn group_key(doc: &Value, key: &GroupKey) -> Value {
    match key {
        GroupKey::All => Value::Null,
        GroupKey::Field(field) => field.resolve(doc).cloned().unwrap_or(Value::Null),
        GroupKey::Month(field) => field
            .resolve(doc)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| Value::from(ts.month()))
            .unwrap_or(Value::Null),
    }
}

fn group_documents(docs: Vec<Value>, group: &Group) -> Vec<Value> {
    let mut buckets: Vec<(Value, Vec<Value>)> = Vec::new();
    for doc in docs {
        let key = group_key(&doc, &group.key);
        match buckets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(doc),
            None => buckets.push((key, vec![doc])),
        }
    }

    buckets
        .into_iter()
        .map(|(key, members)| {
            let mut out = Map::new();
            if group.key != GroupKey::All {
                out.insert(group.key_as.clone(), key);
            }
            for (name, accumulator) in &group.fields {
                out.insert(name.clone(), accumulate(accumulator, &members));
            }
            Value::Object(out)
        })
        .collect()
}

fn numbers<'a>(members: &'a [Value], field: &'a FieldPath) -> impl Iterator<Item = f64> + 'a {
    members
        .iter()
        .filter_map(move |doc| field.resolve(doc).and_then(Value::as_f64))
}

fn accumulate(accumulator: &Accumulator, members: &[Value]) -> Value {
    match accumulator {
        Accumulator::Count => Value::from(members.len()),
        Accumulator::Sum(field) => Value::from(numbers(members, field).sum::<f64>()),
        Accumulator::Avg(field) => {
            let (sum, count) = numbers(members, field).fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
            if count == 0 {
                Value::Null
            } else {
                Value::from(sum / count as f64)
            }
        }
        Accumulator::Min(field) => members
            .iter()
            .filter_map(|doc| field.resolve(doc))
            .min_by(|a, b| compare_values(Some(a), Some(b)))
            .cloned()
            .unwrap_or(Value::Null),
        Accumulator::Max(field) => members
            .iter()
            .filter_map(|doc| field.resolve(doc))
            .max_by(|a, b| compare_values(Some(a), Some(b)))
            .cloned()
            .unwrap_or(Value::Null),
        Accumulator::Push(field) => Value::Array(
            members
                .iter()
                .filter_map(|doc| field.resolve(doc).cloned())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tours() -> Vec<Value> {
        vec![
            json!({ "id": "1", "name": "Forest Hiker", "difficulty": "easy", "price": 397, "ratingsAverage": 4.7,
                    "startDates": ["2021-04-25T09:00:00Z", "2021-07-20T09:00:00Z"] }),
            json!({ "id": "2", "name": "Sea Explorer", "difficulty": "medium", "price": 497, "ratingsAverage": 4.8,
                    "startDates": ["2021-06-19T09:00:00Z", "2021-07-20T09:00:00Z"] }),
            json!({ "id": "3", "name": "Snow Adventurer", "difficulty": "difficult", "price": 997, "ratingsAverage": 4.5,
                    "startDates": [] }),
            json!({ "id": "4", "name": "City Wanderer", "difficulty": "easy", "price": 1197, "ratingsAverage": 4.6 }),
        ]
    }

    #[test]
    fn test_group_by_field_with_accumulators() {
        let pipeline = Pipeline::new()
            .stage(Stage::Group(Group {
                key: GroupKey::Field(FieldPath::new("difficulty")),
                key_as: "difficulty".to_string(),
                fields: vec![
                    ("numTours".to_string(), Accumulator::Count),
                    ("avgPrice".to_string(), Accumulator::Avg(FieldPath::new("price"))),
                    ("minPrice".to_string(), Accumulator::Min(FieldPath::new("price"))),
                    ("maxPrice".to_string(), Accumulator::Max(FieldPath::new("price"))),
                ],
            }))
            .stage(Stage::Sort(vec![SortKey::asc("avgPrice")]));

        let out = pipeline.run(tours());

        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["difficulty"], "medium");
        assert_eq!(out[1]["difficulty"], "easy");
        assert_eq!(out[1]["numTours"], 2);
        assert_eq!(out[1]["avgPrice"], 797.0);
        assert_eq!(out[1]["minPrice"], 397);
        assert_eq!(out[1]["maxPrice"], 1197);
        assert_eq!(out[2]["difficulty"], "difficult");
    }

    #[test]
    fn test_project_trims_group_output() {
        let pipeline = Pipeline::new()
            .stage(Stage::Group(Group {
                key: GroupKey::Field(FieldPath::new("difficulty")),
                key_as: "difficulty".to_string(),
                fields: vec![
                    ("numTours".to_string(), Accumulator::Count),
                    ("avgPrice".to_string(), Accumulator::Avg(FieldPath::new("price"))),
                ],
            }))
            .stage(Stage::Sort(vec![SortKey::desc("numTours")]))
            .stage(Stage::Project(Projection::Include(vec![
                "difficulty".to_string(),
                "numTours".to_string(),
            ])))
            .stage(Stage::Limit(1));

        assert_eq!(
            pipeline.run(tours()),
            vec![json!({ "difficulty": "easy", "numTours": 2 })]
        );
    }

    #[test]
    fn test_unwind_and_group_by_month() {
        let pipeline = Pipeline::new()
            .stage(Stage::Unwind(FieldPath::new("startDates")))
            .stage(Stage::Match(
                Filter::new()
                    .gte("startDates", "2021-01-01")
                    .lt("startDates", "2022-01-01"),
            ))
            .stage(Stage::Group(Group {
                key: GroupKey::Month(FieldPath::new("startDates")),
                key_as: "month".to_string(),
                fields: vec![
                    ("numTourStarts".to_string(), Accumulator::Count),
                    ("tours".to_string(), Accumulator::Push(FieldPath::new("name"))),
                ],
            }))
            .stage(Stage::Sort(vec![SortKey::asc("month")]))
            .stage(Stage::Limit(12));

        let out = pipeline.run(tours());

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], json!({ "month": 4, "numTourStarts": 1, "tours": ["Forest Hiker"] }));
        assert_eq!(out[2]["month"], 7);
        assert_eq!(out[2]["numTourStarts"], 2);
    }

    #[test]
    fn test_group_all_over_empty_input_yields_nothing() {
        let pipeline = Pipeline::new().stage(Stage::Group(Group {
            key: GroupKey::All,
            key_as: String::new(),
            fields: vec![("nRating".to_string(), Accumulator::Count)],
        }));

        assert!(pipeline.run(Vec::new()).is_empty());
        assert_eq!(pipeline.run(tours()), vec![json!({ "nRating": 4 })]);
    }

    #[test]
    fn test_split_leading_match() {
        let pipeline = Pipeline::new()
            .stage(Stage::Match(Filter::new().eq("tour", "t1")))
            .stage(Stage::Limit(1));

        let (filter, rest) = pipeline.split_leading_match();
        assert!(filter.is_some());
        assert_eq!(rest.len(), 1);

        let unwind_first = Pipeline::new().stage(Stage::Unwind(FieldPath::new("startDates")));
        assert!(unwind_first.split_leading_match().0.is_none());
    }

    #[test]
    fn test_with_leading_match_merges_filters() {
        let pipeline = Pipeline::new()
            .stage(Stage::Match(Filter::new().eq("tour", "t1")))
            .with_leading_match(Filter::new().ne("secretTour", true));

        assert_eq!(pipeline.stages().len(), 1);
        let (filter, _) = pipeline.split_leading_match();
        assert_eq!(filter.map(|f| f.conditions().len()), Some(2));

        let prepended = Pipeline::new()
            .stage(Stage::Limit(1))
            .with_leading_match(Filter::new().ne("secretTour", true));
        assert_eq!(prepended.stages().len(), 2);
        assert!(prepended.split_leading_match().0.is_some());
    }
}
