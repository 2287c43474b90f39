//! End-to-end scenarios over `#[derive(Entity)]` types and `FakeExecutor`,
//! exercising the full translation pipeline the way a caller would.

use compact_str::CompactString;
use relmap::prelude::*;
use relmap::Entity;
use relmap_core::registry;

#[derive(Debug, Default, Entity)]
#[relmap(table = "Person")]
struct Person {
    #[relmap(key, identity)]
    id: i64,
    first_name: CompactString,
    last_name: CompactString,
    age: i32,
    gender: CompactString,
    birthdate: Option<CompactString>,
    bonus: Option<i32>,
}

#[derive(Debug, Default, Entity)]
#[relmap(table = "Log")]
struct Log {
    #[relmap(key)]
    id: CompactString,
    message: CompactString,
}

#[derive(Debug, Default, Entity)]
#[relmap(table = "Organization")]
struct Organization {
    #[relmap(key, identity)]
    id: i64,
    name: CompactString,
    #[relmap(link(Address))]
    headquarters_address_id: i64,
}

#[derive(Debug, Default, Entity)]
#[relmap(table = "Address")]
struct Address {
    #[relmap(key, identity)]
    id: i64,
    #[relmap(link(Country))]
    country_id: i64,
}

#[derive(Debug, Default, Entity)]
#[relmap(table = "Country")]
struct Country {
    #[relmap(key, identity)]
    id: i64,
    name: CompactString,
}

#[derive(Debug, Default, Entity)]
#[relmap(table = "PersonDetail")]
struct PersonDetail {
    #[relmap(key, identity)]
    id: i64,
    #[relmap(link(Organization))]
    employer_id: i64,
    #[relmap(remote_property(
        Country,
        path = [employer_id, headquarters_address_id, country_id, name]
    ))]
    employer_headquarters_country_name: CompactString,
}

/// Scenario 1: two chained `Where`s, a `StartsWith`, descending order, and
/// `Take` all compose into one parameterized statement.
#[test]
fn scenario_filter_order_and_page() {
    let query = Query::<Person>::new()
        .unwrap()
        .filter(cmp::ge(Expr::col("age"), Expr::val(18i32)))
        .filter(string::starts_with(
            Expr::col("last_name"),
            Expr::val("D"),
        ))
        .order_by_descending(Expr::col("age"))
        .take(10);

    let mut exec = FakeExecutor::new();
    let rows = query.to_list(&mut exec).unwrap();
    assert!(rows.is_empty());

    let cmd = exec.last_command.unwrap();
    assert!(cmd.sql.contains("FROM [Person] AS [t0]"));
    assert!(cmd.sql.contains("[t0].[age] >= @p__linq__0"));
    assert!(cmd
        .sql
        .contains("[t0].[last_name] LIKE @p__linq__1 + '%' ESCAPE '\\'"));
    assert!(cmd.sql.contains("ORDER BY [t0].[age] DESC"));
    assert!(cmd.sql.contains("OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"));
    assert_eq!(cmd.parameters.len(), 2);
    assert_eq!(cmd.parameters[0].value, SqlValue::Int(18));
    assert_eq!(cmd.parameters[1].value, SqlValue::Text("D".into()));
}

/// Scenario 2: `Contains` over a captured list lowers to a parameterized
/// `IN`, one parameter per element, in order.
#[test]
fn scenario_contains_lowers_to_in() {
    let ids = [1i64, 5, 10, 20];
    let haystack = ids.iter().map(|n| Expr::val(*n)).collect();
    let query = Query::<Person>::new()
        .unwrap()
        .filter(Expr::In {
            needle: Box::new(Expr::col("id")),
            haystack,
        });

    let mut exec = FakeExecutor::new();
    query.to_list(&mut exec).unwrap();

    let cmd = exec.last_command.unwrap();
    assert!(cmd
        .sql
        .contains("[t0].[id] IN (@p__linq__0, @p__linq__1, @p__linq__2, @p__linq__3)"));
    assert_eq!(cmd.parameters.len(), 4);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(cmd.parameters[i].value, SqlValue::BigInt(*id));
    }
}

/// Scenario 3: an equality comparison against `null` lowers to `IS NULL`
/// and binds no parameter.
#[test]
fn scenario_null_equality() {
    let query = Query::<Person>::new()
        .unwrap()
        .filter(cmp::eq(Expr::col("birthdate"), Expr::Constant(SqlValue::Null)));

    let mut exec = FakeExecutor::new();
    query.to_list(&mut exec).unwrap();

    let cmd = exec.last_command.unwrap();
    assert!(cmd.sql.contains("[t0].[birthdate] IS NULL"));
    assert!(cmd.parameters.is_empty());
}

/// Scenario 4: an explicit multi-segment remote path joins every
/// intermediate table in declaration order, each uniquely aliased.
#[test]
fn scenario_explicit_remote_path_joins_in_order() {
    let query = Query::<PersonDetail>::new().unwrap().filter(cmp::eq(
        Expr::col("employer_headquarters_country_name"),
        Expr::val("USA"),
    ));

    let mut exec = FakeExecutor::new();
    query.to_list(&mut exec).unwrap();

    let cmd = exec.last_command.unwrap();
    let organization_pos = cmd.sql.find("[Organization]").unwrap();
    let address_pos = cmd.sql.find("[Address]").unwrap();
    let country_pos = cmd.sql.find("[Country]").unwrap();
    assert!(organization_pos < address_pos);
    assert!(address_pos < country_pos);
    assert_eq!(cmd.sql.matches("LEFT JOIN").count(), 3);
    assert!(cmd.sql.contains("= @p__linq__0"));
    assert_eq!(cmd.parameters.len(), 1);
    assert_eq!(cmd.parameters[0].value, SqlValue::Text("USA".into()));
}

/// Scenario 5: `Count` with a predicate builds a scalar `SELECT COUNT(*)`.
#[test]
fn scenario_count_with_predicate() {
    let query = Query::<Person>::new().unwrap();
    let mut exec = FakeExecutor::with_rows(vec![vec![("".to_string(), SqlValue::BigInt(3))]]);
    let count = query
        .count(&mut exec, Some(cmp::eq(Expr::col("gender"), Expr::val("Female"))))
        .unwrap();
    assert_eq!(count, 3);

    let cmd = exec.last_command.unwrap();
    assert!(cmd.sql.starts_with("SELECT COUNT(*)"));
    assert!(cmd.sql.contains("[t0].[gender] = @p__linq__0"));
}

/// Scenario 6: an identity-key insert omits the PK and appends the
/// identity fetch; a non-identity insert includes the PK column/value.
#[test]
fn scenario_insert_identity_vs_explicit_key() {
    let dialect = relmap_core::dialect::SqlServerDialect;
    let person_mapping = registry::resolve::<Person>().unwrap();
    let person_values = vec![
        ("id".to_string(), SqlValue::BigInt(0)),
        ("first_name".to_string(), SqlValue::Text("Jane".into())),
        ("last_name".to_string(), SqlValue::Text("Doe".into())),
        ("age".to_string(), SqlValue::Int(0)),
        ("gender".to_string(), SqlValue::Text("".into())),
    ];
    let insert_person = relmap_core::command::insert(&dialect, &person_mapping, &person_values).unwrap();
    assert!(!insert_person.sql.contains("[id]"));
    assert!(insert_person.sql.ends_with("SELECT SCOPE_IDENTITY()"));

    let log_mapping = registry::resolve::<Log>().unwrap();
    let log_values = vec![
        ("id".to_string(), SqlValue::Text("11111111-1111-1111-1111-111111111111".into())),
        ("message".to_string(), SqlValue::Text("hello".into())),
    ];
    let insert_log = relmap_core::command::insert(&dialect, &log_mapping, &log_values).unwrap();
    assert!(insert_log.sql.contains("[id]"));
    assert!(!insert_log.sql.contains("SCOPE_IDENTITY"));
}

/// `Insert` executed through the facade writes the returned identity value
/// back into the entity's PK field; a non-identity key is left untouched.
#[test]
fn scenario_facade_insert_writes_back_identity() {
    let mut person = Person {
        id: 0,
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        age: 30,
        gender: "Female".into(),
        birthdate: None,
        bonus: None,
    };
    let mut exec = FakeExecutor::with_rows(vec![vec![("".to_string(), SqlValue::BigInt(7))]]);
    Query::<Person>::insert(&mut exec, &mut person).unwrap();
    assert_eq!(person.id, 7);
    let cmd = exec.last_command.unwrap();
    assert!(!cmd.sql.contains("[id]"));
    assert!(cmd.sql.ends_with("SELECT SCOPE_IDENTITY()"));

    let mut log = Log {
        id: "11111111-1111-1111-1111-111111111111".into(),
        message: "hello".into(),
    };
    let mut exec = FakeExecutor::new();
    Query::<Log>::insert(&mut exec, &mut log).unwrap();
    assert_eq!(log.id.as_str(), "11111111-1111-1111-1111-111111111111");
    let cmd = exec.last_command.unwrap();
    assert!(cmd.sql.contains("[id]"));
    assert!(!cmd.sql.contains("SCOPE_IDENTITY"));
}

/// `Min`/`Max`/`Average` (spec §4.6): an empty result is `null` for a
/// nullable selector and an error for a non-nullable one.
#[test]
fn scenario_min_max_avg_respect_selector_nullability() {
    let mut exec = FakeExecutor::new();
    let err = Query::<Person>::new()
        .unwrap()
        .min(&mut exec, Expr::col("age"))
        .unwrap_err();
    assert!(matches!(err, RelmapError::EmptySequence));

    let mut exec = FakeExecutor::new();
    let value = Query::<Person>::new()
        .unwrap()
        .max(&mut exec, Expr::col("bonus"))
        .unwrap();
    assert_eq!(value, SqlValue::Null);

    let mut exec = FakeExecutor::with_rows(vec![vec![("".to_string(), SqlValue::Int(42))]]);
    let value = Query::<Person>::new()
        .unwrap()
        .avg(&mut exec, Expr::col("age"))
        .unwrap();
    assert_eq!(value, SqlValue::Int(42));
}

/// `Select` (spec §4.5): a shaped projection casts a boolean constant to
/// `BIT` and allows a conditional binding alongside it.
#[test]
fn scenario_select_casts_boolean_constant_and_allows_conditional() {
    let query = Query::<Person>::new().unwrap().select(vec![
        Binding {
            target_name: "flagged",
            value: Expr::Constant(SqlValue::Bool(true)),
        },
        Binding {
            target_name: "display_name",
            value: Expr::Conditional {
                test: Box::new(cmp::eq(Expr::col("gender"), Expr::val("Female"))),
                if_true: Box::new(Expr::col("first_name")),
                if_false: Box::new(Expr::col("last_name")),
            },
        },
    ]);

    let mut exec = FakeExecutor::new();
    query.to_list(&mut exec).unwrap();

    let cmd = exec.last_command.unwrap();
    assert!(cmd.sql.contains("CAST(@p__linq__0 AS BIT) AS [flagged]"));
    assert!(cmd.sql.contains(
        "CASE WHEN [t0].[gender] = @p__linq__1 THEN [t0].[first_name] ELSE [t0].[last_name] END AS [display_name]"
    ));
}
