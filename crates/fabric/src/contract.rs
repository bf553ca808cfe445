use fabric_core::{Capability, Column, Error, Relation, Result};

/// Fails when an enforced contract meets SQL the warehouse cannot stage.
///
/// Enforced contracts insert the model's rows through an explicit column
/// list. On warehouses needing view indirection for CTEs, a query with more
/// than one `WITH` cannot be fed into that insert reliably.
pub(crate) fn ensure_stageable(
    capability: &Capability,
    relation: &Relation,
    sql: &str,
    enforced: bool,
) -> Result<()> {
    if !enforced || !capability.view_indirection_for_cte {
        return Ok(());
    }

    let with_clauses = count_with_clauses(sql);
    if with_clauses > 1 {
        return Err(Error::capability_violation(
            relation,
            format!(
                "an enforced contract on a query with nested CTEs ({with_clauses} WITH clauses); \
                 move the inner CTEs into separate models or disable contract enforcement"
            ),
        ));
    }
    Ok(())
}

/// Counts `WITH` keywords outside quoted text and comments.
pub(crate) fn count_with_clauses(sql: &str) -> usize {
    let mut count = 0;
    let mut word = String::new();
    let mut chars = sql.chars().peekable();

    let mut flush = |word: &mut String| {
        if word.eq_ignore_ascii_case("with") {
            count += 1;
        }
        word.clear();
    };

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '[' => {
                flush(&mut word);
                let close = if c == '[' { ']' } else { c };
                for inner in chars.by_ref() {
                    if inner == close {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                flush(&mut word);
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                flush(&mut word);
                chars.next();
                let mut previous = ' ';
                for inner in chars.by_ref() {
                    if previous == '*' && inner == '/' {
                        break;
                    }
                    previous = inner;
                }
            }
            c if c.is_alphanumeric() || c == '_' => word.push(c),
            _ => flush(&mut word),
        }
    }
    flush(&mut word);

    count
}

/// Staged columns must match the declared contract by name, order and type.
pub(crate) fn ensure_matches(
    relation: &Relation,
    declared: &[Column],
    staged: &[Column],
) -> Result<()> {
    let mut problems = vec![];

    for (index, column) in declared.iter().enumerate() {
        match staged.get(index) {
            Some(actual) if !actual.name.eq_ignore_ascii_case(&column.name) => {
                problems.push(format!(
                    "position {}: expected `{}`, found `{}`",
                    index + 1,
                    column.name,
                    actual.name
                ))
            }
            Some(actual) if !actual.same_type(column) => problems.push(format!(
                "`{}`: declared {}, query returns {}",
                column.name,
                column.data_type(),
                actual.data_type()
            )),
            Some(_) => {}
            None => problems.push(format!("`{}` is missing from the query", column.name)),
        }
    }

    for extra in staged.iter().skip(declared.len()) {
        problems.push(format!("`{}` is not declared", extra.name));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::contract_mismatch(relation, problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation() -> Relation {
        Relation::table("dw", "dbo", "orders").unwrap()
    }

    #[test]
    fn with_keywords_are_counted_as_words() {
        assert_eq!(count_with_clauses("select 1"), 0);
        assert_eq!(count_with_clauses("WITH a AS (select 1) select * from a"), 1);
        assert_eq!(
            count_with_clauses("with a as (with b as (select 1) select * from b) select * from a"),
            2
        );
        assert_eq!(count_with_clauses("select withdrawn, with_tax from t"), 0);
    }

    #[test]
    fn quoted_and_commented_with_is_ignored() {
        assert_eq!(
            count_with_clauses("with a as (select 'with' as \"with\") select * from a -- with\n"),
            1
        );
        assert_eq!(count_with_clauses("/* with */ select [with] from t"), 0);
    }

    #[test]
    fn nested_ctes_fail_only_under_enforcement() {
        let sql = "with a as (with b as (select 1 as x) select * from b) select * from a";

        let err = ensure_stageable(&Capability::FABRIC, &relation(), sql, true).unwrap_err();
        assert!(err.is_capability_violation());
        assert!(err.to_string().contains("nested CTEs"));
        assert!(err.to_string().contains("\"orders\""));

        ensure_stageable(&Capability::FABRIC, &relation(), sql, false).unwrap();
        ensure_stageable(&Capability::ANSI, &relation(), sql, true).unwrap();
    }

    #[test]
    fn contract_columns_must_line_up() {
        let declared = vec![
            Column::new("id", "int"),
            Column::new("name", "varchar").with_char_size(50),
        ];

        ensure_matches(&relation(), &declared, &declared.clone()).unwrap();

        let swapped = vec![declared[1].clone(), declared[0].clone()];
        assert!(ensure_matches(&relation(), &declared, &swapped)
            .unwrap_err()
            .is_contract_mismatch());

        let retyped = vec![Column::new("id", "bigint"), declared[1].clone()];
        let err = ensure_matches(&relation(), &declared, &retyped).unwrap_err();
        assert!(err.to_string().contains("declared int, query returns bigint"));

        let extra = vec![declared[0].clone(), declared[1].clone(), Column::new("x", "int")];
        assert!(ensure_matches(&relation(), &declared, &extra)
            .unwrap_err()
            .to_string()
            .contains("`x` is not declared"));
    }
}
