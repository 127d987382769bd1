//! Integration tests for task filtering and grouping.
//!
//! Every test seeds an in-memory database and runs the same path the HTTP
//! handler runs: bind the scope to the path workspace, then filter.

use serde_json::json;
use std::collections::HashSet;
use taskhub::db::Database;
use taskhub::error::ErrorCode;
use taskhub::query::scope::bind_to_path;
use taskhub::query::sort::filter_sort;
use taskhub::query::{
    FilterField, FilterPayload, FilterResponse, FilterRule, GroupBy, NO_VALUE, NativeField,
    Operator, Scope, TagsFilter, dropped_rules,
};
use taskhub::types::NewTask;

struct Fixture {
    db: Database,
    ws: String,
    space: String,
    folder: String,
    list_a: String,
    list_b: String,
    user: String,
}

fn setup() -> Fixture {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    let user = db.create_user("owner@example.com", Some("Owner")).unwrap();
    let ws = db.create_workspace("Acme", &user.id).unwrap();
    let space = db.create_space(&ws.id, "Product").unwrap();
    let folder = db.create_folder(&space.id, "Q3").unwrap();
    let list_a = db.create_list(&space.id, Some(&folder.id), "A").unwrap();
    let list_b = db.create_list(&space.id, None, "B").unwrap();
    Fixture {
        db,
        ws: ws.id,
        space: space.id,
        folder: folder.id,
        list_a: list_a.id,
        list_b: list_b.id,
        user: user.id,
    }
}

impl Fixture {
    fn task(&self, list_id: &str, name: &str, created_at: i64) -> String {
        self.db
            .create_task(NewTask::new(list_id, name).created_at(created_at))
            .unwrap()
            .id
    }

    fn run(&self, payload: FilterPayload) -> FilterResponse {
        self.run_sorted(payload, Some("created_at"), Some("asc"))
    }

    fn run_sorted(
        &self,
        mut payload: FilterPayload,
        sort: Option<&str>,
        order: Option<&str>,
    ) -> FilterResponse {
        payload.validate().unwrap();
        bind_to_path(&mut payload.scope, &self.ws).unwrap();
        self.db
            .filter_tasks(&self.ws, &payload, filter_sort(sort, order))
            .unwrap()
    }
}

fn ids(response: &FilterResponse) -> Vec<String> {
    response.task_ids().into_iter().map(str::to_string).collect()
}

fn id_set(response: &FilterResponse) -> HashSet<String> {
    ids(response).into_iter().collect()
}

fn set_of(items: &[&String]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

mod scope_tests {
    use super::*;

    #[test]
    fn narrowest_locator_wins() {
        let f = setup();
        let in_a = f.task(&f.list_a, "in a", 1);
        let _in_b = f.task(&f.list_b, "in b", 2);

        let both = Scope {
            list_id: Some(f.list_a.clone()),
            space_id: Some(f.space.clone()),
            ..Scope::default()
        };
        let with_both = f.run(FilterPayload::new(both));
        let list_only = f.run(FilterPayload::new(Scope::list(&f.list_a)));

        assert_eq!(ids(&with_both), vec![in_a]);
        assert_eq!(ids(&with_both), ids(&list_only));
    }

    #[test]
    fn folder_space_and_workspace_scopes() {
        let f = setup();
        let in_a = f.task(&f.list_a, "in a", 1);
        let in_b = f.task(&f.list_b, "in b", 2);

        assert_eq!(ids(&f.run(FilterPayload::new(Scope::folder(&f.folder)))), vec![in_a.clone()]);
        assert_eq!(
            ids(&f.run(FilterPayload::new(Scope::space(&f.space)))),
            vec![in_a.clone(), in_b.clone()]
        );
        assert_eq!(
            ids(&f.run(FilterPayload::new(Scope::workspace(&f.ws)))),
            vec![in_a, in_b]
        );
    }

    #[test]
    fn payload_workspace_conflicting_with_path_is_rejected() {
        let f = setup();
        f.task(&f.list_a, "task", 1);
        let other = f.db.create_workspace("Other", &f.user).unwrap();

        let mut payload = FilterPayload::new(Scope::workspace(&other.id));
        let err = bind_to_path(&mut payload.scope, &f.ws).unwrap_err();
        assert_eq!(err.code, ErrorCode::ScopeConflict);
    }

    #[test]
    fn foreign_list_id_yields_nothing() {
        let f = setup();
        let other_ws = f.db.create_workspace("Other", &f.user).unwrap();
        let other_space = f.db.create_space(&other_ws.id, "S").unwrap();
        let other_list = f.db.create_list(&other_space.id, None, "L").unwrap();
        f.task(&other_list.id, "foreign", 1);

        let response = f.run(FilterPayload::new(Scope::list(&other_list.id)));
        assert_eq!(response.count, 0);
    }
}

mod native_field_tests {
    use super::*;

    #[test]
    fn status_priority_and_name_predicates() {
        let f = setup();
        let done = f
            .db
            .create_task(
                NewTask::new(&f.list_a, "Write launch post")
                    .status("done")
                    .priority("high")
                    .created_at(1),
            )
            .unwrap()
            .id;
        let open = f
            .db
            .create_task(NewTask::new(&f.list_a, "Fix login bug").priority("low").created_at(2))
            .unwrap()
            .id;

        let by_status = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .filter(FilterRule::native(NativeField::Status, Operator::Eq, json!("done"))),
        );
        assert_eq!(ids(&by_status), vec![done.clone()]);

        let by_priority = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(
            FilterRule::native(NativeField::Priority, Operator::In, json!(["low", "urgent"])),
        ));
        assert_eq!(ids(&by_priority), vec![open.clone()]);

        let by_name = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .filter(FilterRule::native(NativeField::Name, Operator::Contains, json!("LOGIN"))),
        );
        assert_eq!(ids(&by_name), vec![open]);
    }

    #[test]
    fn due_date_range() {
        let f = setup();
        let early = f
            .db
            .create_task(NewTask::new(&f.list_a, "early").due_date("2024-01-10").created_at(1))
            .unwrap()
            .id;
        let late = f
            .db
            .create_task(
                NewTask::new(&f.list_a, "late")
                    .due_date("2024-03-01T12:00:00Z")
                    .created_at(2),
            )
            .unwrap()
            .id;
        let undated = f.task(&f.list_a, "undated", 3);

        let before = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .filter(FilterRule::native(NativeField::DueDate, Operator::Lt, json!("2024-02-01"))),
        );
        assert_eq!(ids(&before), vec![early]);

        let after = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(FilterRule::native(
            NativeField::DueDate,
            Operator::Gte,
            json!("2024-02-01T00:00:00Z"),
        )));
        assert_eq!(ids(&after), vec![late]);

        let empty = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .filter(FilterRule::unary(FilterField::Native(NativeField::DueDate), Operator::IsEmpty)),
        );
        assert_eq!(ids(&empty), vec![undated]);
    }

    #[test]
    fn assignee_predicates() {
        let f = setup();
        let alice = f.db.create_user("alice@example.com", None).unwrap();
        let bob = f.db.create_user("bob@example.com", None).unwrap();
        let t_alice = f.task(&f.list_a, "alice's", 1);
        let t_bob = f.task(&f.list_a, "bob's", 2);
        let t_none = f.task(&f.list_a, "nobody's", 3);
        f.db
            .set_task_assignees(&t_alice, Some(&[alice.id.clone()]))
            .unwrap();
        f.db
            .set_task_assignees(&t_bob, Some(&[bob.id.clone(), alice.id.clone()]))
            .unwrap();

        let bob_only = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(
            FilterRule::native(NativeField::AssigneeId, Operator::Eq, json!(bob.id)),
        ));
        assert_eq!(ids(&bob_only), vec![t_bob.clone()]);

        let not_bob = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(
            FilterRule::native(NativeField::AssigneeId, Operator::Ne, json!(bob.id)),
        ));
        assert_eq!(ids(&not_bob), vec![t_alice.clone(), t_none.clone()]);

        let unassigned = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(
            FilterRule::unary(FilterField::Native(NativeField::AssigneeId), Operator::IsEmpty),
        ));
        assert_eq!(ids(&unassigned), vec![t_none]);
    }

    #[test]
    fn unknown_field_is_dropped_and_counted() {
        let f = setup();
        let a = f.task(&f.list_a, "a", 1);
        let b = f.task(&f.list_a, "b", 2);

        let before = dropped_rules();
        let response = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(FilterRule::new(
            FilterField::parse("colour"),
            Operator::Eq,
            Some(json!("red")),
        )));
        assert_eq!(ids(&response), vec![a, b]);
        assert!(dropped_rules() > before);
    }
}

mod tags_tests {
    use super::*;

    #[test]
    fn any_versus_all() {
        let f = setup();
        let tag_a = f.db.create_tag(&f.ws, "A", None).unwrap();
        let tag_b = f.db.create_tag(&f.ws, "B", Some("#ff0000")).unwrap();
        let t1 = f.task(&f.list_a, "T1", 1);
        let t2 = f.task(&f.list_a, "T2", 2);
        let _t3 = f.task(&f.list_a, "T3", 3);
        f.db.assign_tag(&t1, &tag_a.id).unwrap();
        f.db.assign_tag(&t1, &tag_b.id).unwrap();
        f.db.assign_tag(&t2, &tag_a.id).unwrap();
        // Idempotent.
        f.db.assign_tag(&t2, &tag_a.id).unwrap();

        let requested = vec![tag_a.id.clone(), tag_b.id.clone()];
        let any = f.run(
            FilterPayload::new(Scope::list(&f.list_a)).tags(TagsFilter::any(requested.clone())),
        );
        assert_eq!(id_set(&any), set_of(&[&t1, &t2]));

        let all = f.run(FilterPayload::new(Scope::list(&f.list_a)).tags(TagsFilter::all(requested)));
        assert_eq!(ids(&all), vec![t1]);
    }

    #[test]
    fn duplicated_request_ids_do_not_break_all() {
        let f = setup();
        let tag_a = f.db.create_tag(&f.ws, "A", None).unwrap();
        let t1 = f.task(&f.list_a, "T1", 1);
        f.db.assign_tag(&t1, &tag_a.id).unwrap();

        let all = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .tags(TagsFilter::all(vec![tag_a.id.clone(), tag_a.id.clone()])),
        );
        assert_eq!(ids(&all), vec![t1]);
    }

    #[test]
    fn empty_tag_list_is_no_constraint() {
        let f = setup();
        let t1 = f.task(&f.list_a, "T1", 1);
        let t2 = f.task(&f.list_a, "T2", 2);

        let response = f.run(FilterPayload::new(Scope::list(&f.list_a)).tags(TagsFilter::all(vec![])));
        assert_eq!(ids(&response), vec![t1, t2]);
    }

    #[test]
    fn foreign_tag_never_matches() {
        let f = setup();
        let other_ws = f.db.create_workspace("Other", &f.user).unwrap();
        let other_space = f.db.create_space(&other_ws.id, "S").unwrap();
        let other_list = f.db.create_list(&other_space.id, None, "L").unwrap();
        let foreign_tag = f.db.create_tag(&other_ws.id, "Foreign", None).unwrap();
        let foreign_task = f.task(&other_list.id, "foreign", 1);
        f.db.assign_tag(&foreign_task, &foreign_tag.id).unwrap();
        f.task(&f.list_a, "local", 2);

        let err = f.db.assign_tag(&f.task(&f.list_a, "x", 3), &foreign_tag.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::WorkspaceMismatch);

        let response = f.run(
            FilterPayload::new(Scope::workspace(&f.ws))
                .tags(TagsFilter::any(vec![foreign_tag.id.clone()])),
        );
        assert_eq!(response.count, 0);
    }
}

mod custom_field_tests {
    use super::*;

    #[test]
    fn empty_and_not_empty() {
        let f = setup();
        let field = f.db.create_custom_field(&f.ws, "Team", "Text", None).unwrap();
        let no_row = f.task(&f.list_a, "no row", 1);
        let blank = f.task(&f.list_a, "blank", 2);
        let filled = f.task(&f.list_a, "filled", 3);
        f.db.set_custom_field_value(&blank, &field.id, json!("")).unwrap();
        f.db
            .set_custom_field_value(&filled, &field.id, json!("Design"))
            .unwrap();

        let empty = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(FilterRule::unary(
            FilterField::custom(&field.id),
            Operator::IsEmpty,
        )));
        assert_eq!(ids(&empty), vec![no_row, blank]);

        let not_empty = f.run(FilterPayload::new(Scope::list(&f.list_a)).filter(FilterRule::unary(
            FilterField::custom(&field.id),
            Operator::IsNotEmpty,
        )));
        assert_eq!(ids(&not_empty), vec![filled]);
    }

    #[test]
    fn set_then_filter_then_update() {
        let f = setup();
        let field = f.db.create_custom_field(&f.ws, "Stage", "Dropdown", None).unwrap();
        let task = f.task(&f.list_a, "tracked", 1);
        f.db.set_custom_field_value(&task, &field.id, json!("alpha")).unwrap();

        let on_alpha = || {
            f.run(
                FilterPayload::new(Scope::list(&f.list_a))
                    .filter(FilterRule::custom(&field.id, Operator::Eq, json!("alpha"))),
            )
        };
        assert_eq!(ids(&on_alpha()), vec![task.clone()]);

        f.db.set_custom_field_value(&task, &field.id, json!("beta")).unwrap();
        assert_eq!(on_alpha().count, 0);
        assert_eq!(
            f.db.get_custom_field_value(&task, &field.id).unwrap(),
            Some(json!("beta"))
        );
    }

    #[test]
    fn numeric_and_boolean_values_compare_as_text() {
        let f = setup();
        let points = f.db.create_custom_field(&f.ws, "Points", "Number", None).unwrap();
        let flag = f.db.create_custom_field(&f.ws, "Blocked", "Checkbox", None).unwrap();
        let t1 = f.task(&f.list_a, "t1", 1);
        let t2 = f.task(&f.list_a, "t2", 2);
        f.db.set_custom_field_value(&t1, &points.id, json!(5)).unwrap();
        f.db.set_custom_field_value(&t2, &points.id, json!(8)).unwrap();
        f.db.set_custom_field_value(&t2, &flag.id, json!(true)).unwrap();

        let five = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .filter(FilterRule::custom(&points.id, Operator::Eq, json!(5))),
        );
        assert_eq!(ids(&five), vec![t1]);

        let blocked = f.run(
            FilterPayload::new(Scope::list(&f.list_a))
                .filter(FilterRule::custom(&flag.id, Operator::Eq, json!(true))),
        );
        assert_eq!(ids(&blocked), vec![t2]);
    }

    #[test]
    fn foreign_field_never_matches() {
        let f = setup();
        let other_ws = f.db.create_workspace("Other", &f.user).unwrap();
        let foreign = f.db.create_custom_field(&other_ws.id, "Team", "Text", None).unwrap();
        let local_task = f.task(&f.list_a, "local", 1);

        let err = f
            .db
            .set_custom_field_value(&local_task, &foreign.id, json!("x"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WorkspaceMismatch);

        for op in [Operator::IsEmpty, Operator::IsNotEmpty] {
            let response = f.run(
                FilterPayload::new(Scope::workspace(&f.ws))
                    .filter(FilterRule::unary(FilterField::custom(&foreign.id), op)),
            );
            assert_eq!(response.count, 0, "{} matched a foreign field", op);
        }
    }

    #[test]
    fn team_scenario() {
        let f = setup();
        let team = f.db.create_custom_field(&f.ws, "Team", "Text", None).unwrap();
        f.db.enable_field_on_list(&f.list_a, &team.id).unwrap();
        let task1 = f.task(&f.list_a, "Task1", 1);
        let task2 = f.task(&f.list_a, "Task2", 2);
        let task3 = f.task(&f.list_b, "Task3", 3);
        f.db
            .set_custom_field_value(&task1, &team.id, json!("Engineering"))
            .unwrap();
        f.db
            .set_custom_field_value(&task2, &team.id, json!("Marketing"))
            .unwrap();

        let contains = f.run(
            FilterPayload::new(Scope::workspace(&f.ws))
                .filter(FilterRule::custom(&team.id, Operator::Contains, json!("engine"))),
        );
        assert_eq!(ids(&contains), vec![task1.clone()]);

        let grouped = f.run(
            FilterPayload::new(Scope::workspace(&f.ws)).group_by(GroupBy::Custom(team.id.clone())),
        );
        let buckets: Vec<(Option<String>, Vec<String>)> = grouped
            .groups
            .iter()
            .map(|g| (g.group.clone(), g.tasks.iter().map(|t| t.id.clone()).collect()))
            .collect();
        assert_eq!(
            buckets,
            vec![
                (Some("Engineering".to_string()), vec![task1]),
                (Some("Marketing".to_string()), vec![task2]),
                (Some(NO_VALUE.to_string()), vec![task3]),
            ]
        );
        assert_eq!(grouped.count, 3);
    }
}

mod paging_and_grouping_tests {
    use super::*;

    #[test]
    fn single_item_pages_match_full_result() {
        let f = setup();
        for i in 0..5 {
            f.task(&f.list_a, &format!("task {}", i), 1_000 + i);
        }

        // Default sort: created_at DESC, unique per task.
        let full = f.run_sorted(FilterPayload::new(Scope::list(&f.list_a)).page(5, 0), None, None);
        let full_ids = ids(&full);
        assert_eq!(full_ids.len(), 5);

        for k in 0..5 {
            let page = f.run_sorted(
                FilterPayload::new(Scope::list(&f.list_a)).page(1, k as i64),
                None,
                None,
            );
            assert_eq!(ids(&page), vec![full_ids[k].clone()], "offset {}", k);
        }
    }

    #[test]
    fn count_is_page_size() {
        let f = setup();
        for i in 0..4 {
            f.task(&f.list_a, &format!("task {}", i), i);
        }
        let page = f.run(FilterPayload::new(Scope::list(&f.list_a)).page(3, 2));
        assert_eq!(page.count, 2);
    }

    #[test]
    fn grouping_covers_every_task_once() {
        let f = setup();
        let statuses = ["done", "to_do", "done", "blocked", "to_do"];
        for (i, status) in statuses.iter().enumerate() {
            f.db
                .create_task(
                    NewTask::new(&f.list_a, format!("t{}", i))
                        .status(*status)
                        .created_at(i as i64),
                )
                .unwrap();
        }
        let flat = f.run(FilterPayload::new(Scope::list(&f.list_a)));

        for group_by in [GroupBy::Status, GroupBy::Priority, GroupBy::DueDate, GroupBy::AssigneeId] {
            let grouped = f.run(FilterPayload::new(Scope::list(&f.list_a)).group_by(group_by.clone()));
            let all: Vec<String> = ids(&grouped);
            let unique: HashSet<String> = all.iter().cloned().collect();
            assert_eq!(all.len(), unique.len(), "{:?} put a task in two buckets", group_by);
            assert_eq!(unique, id_set(&flat), "{:?} dropped a task", group_by);
        }

        let by_status = f.run(FilterPayload::new(Scope::list(&f.list_a)).group_by(GroupBy::Status));
        let labels: Vec<Option<String>> = by_status.groups.iter().map(|g| g.group.clone()).collect();
        assert_eq!(
            labels,
            vec![
                Some("done".to_string()),
                Some("to_do".to_string()),
                Some("blocked".to_string())
            ]
        );

        let by_priority =
            f.run(FilterPayload::new(Scope::list(&f.list_a)).group_by(GroupBy::Priority));
        assert_eq!(by_priority.groups.len(), 1);
        assert_eq!(by_priority.groups[0].group.as_deref(), Some(NO_VALUE));
    }

    #[test]
    fn ungrouped_response_has_one_null_bucket() {
        let f = setup();
        f.task(&f.list_a, "only", 1);
        let response = f.run(FilterPayload::new(Scope::list(&f.list_a)));
        assert_eq!(response.groups.len(), 1);
        assert_eq!(response.groups[0].group, None);
    }
}
