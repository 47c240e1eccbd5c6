// src/services/report_filter.rs

//! Gramática dos filtros do relatório de ativos.
//!
//! Cada filtro é `chave<op>valor` (ex.: `depto:TI`, `valor > 500`,
//! `fecha_adq<2024-01-01`) ou um termo livre (`laptop`). O texto vira uma
//! lista de `FilterClause` antes de qualquer SQL; só depois `push_clauses`
//! traduz as cláusulas para o `QueryBuilder` de `db::report_repo`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use std::str::FromStr;

use crate::common::db_utils::contains_pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    Department,
    Category,
    Location,
    State,
    Supplier,
    Name,
    Code,
    Value,
    AcquisitionDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Date,
}

impl ReportField {
    /// Chaves em inglês e os apelidos em espanhol usados pelo frontend.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "department" | "depto" => Some(ReportField::Department),
            "category" | "categoria" => Some(ReportField::Category),
            "location" | "ubicacion" => Some(ReportField::Location),
            "state" | "estado" => Some(ReportField::State),
            "supplier" | "proveedor" => Some(ReportField::Supplier),
            "name" | "nombre" => Some(ReportField::Name),
            "code" | "codigo" => Some(ReportField::Code),
            "value" | "valor" => Some(ReportField::Value),
            "acquisition-date" | "acquisition_date" | "fecha_adq" => Some(ReportField::AcquisitionDate),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            ReportField::Department => "d.name",
            ReportField::Category => "ci.name",
            ReportField::Location => "l.name",
            ReportField::State => "s.name",
            ReportField::Supplier => "sp.name",
            ReportField::Name => "a.name",
            ReportField::Code => "a.internal_code",
            ReportField::Value => "a.current_value",
            ReportField::AcquisitionDate => "a.acquired_on",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            ReportField::Value => FieldKind::Number,
            ReportField::AcquisitionDate => FieldKind::Date,
            _ => FieldKind::Text,
        }
    }
}

// Colunas consultadas pelo termo livre
const FREE_TEXT_FIELDS: [ReportField; 7] = [
    ReportField::Name,
    ReportField::Code,
    ReportField::Department,
    ReportField::Category,
    ReportField::Location,
    ReportField::State,
    ReportField::Supplier,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Contains,
    Greater,
    Less,
    Equal,
}

impl FilterOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(FilterOp::Contains),
            '>' => Some(FilterOp::Greater),
            '<' => Some(FilterOp::Less),
            '=' => Some(FilterOp::Equal),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            FilterOp::Contains => " ILIKE ",
            FilterOp::Greater => " > ",
            FilterOp::Less => " < ",
            FilterOp::Equal => " = ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    Compare {
        field: ReportField,
        op: FilterOp,
        literal: Literal,
    },
    FreeText(String),
}

// ---
// Parser
// ---

/// Converte a lista de filtros em cláusulas. Filtros vazios são ignorados;
/// valores numéricos/data inválidos descartam só aquela cláusula.
pub fn parse_filters<S: AsRef<str>>(filters: &[S]) -> Vec<FilterClause> {
    filters.iter().filter_map(|f| parse_filter(f.as_ref())).collect()
}

pub fn parse_filter(raw: &str) -> Option<FilterClause> {
    let token = raw.trim();
    if token.is_empty() {
        return None;
    }

    let Some((key, op_char, value)) = split_structured(token) else {
        return Some(FilterClause::FreeText(token.to_string()));
    };

    // Chave desconhecida: o token inteiro vira busca livre
    let Some(field) = ReportField::from_key(key) else {
        return Some(FilterClause::FreeText(token.to_string()));
    };
    let op = FilterOp::from_char(op_char)?;

    let literal = match (field.kind(), op) {
        (FieldKind::Text, _) | (_, FilterOp::Contains) => Literal::Text(value.to_string()),
        (FieldKind::Number, _) => match parse_number(value) {
            Some(n) => Literal::Number(n),
            None => {
                tracing::warn!("Filtro ignorado: valor numérico inválido em '{}'", token);
                return None;
            }
        },
        (FieldKind::Date, _) => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(d) => Literal::Date(d),
            Err(_) => {
                tracing::warn!("Filtro ignorado: data inválida em '{}' (use AAAA-MM-DD)", token);
                return None;
            }
        },
    };

    Some(FilterClause::Compare { field, op, literal })
}

// "chave  op  valor" -> (chave, op, valor). A chave aceita letras, dígitos, '_' e '-'.
fn split_structured(token: &str) -> Option<(&str, char, &str)> {
    let key_end = token
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(token.len());
    if key_end == 0 {
        return None;
    }

    let (key, rest) = token.split_at(key_end);
    let mut chars = rest.trim_start().chars();
    let op = chars.next()?;
    FilterOp::from_char(op)?;

    let value = chars.as_str().trim();
    if value.is_empty() {
        return None;
    }
    Some((key, op, value))
}

fn parse_number(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

// ---
// Tradução para SQL
// ---

/// Acrescenta cada cláusula como `AND (...)`. Espera os aliases
/// `a`, `d`, `ci`, `l`, `s`, `sp` usados em `db::report_repo`.
pub fn push_clauses(qb: &mut QueryBuilder<'_, Postgres>, clauses: &[FilterClause]) {
    for clause in clauses {
        qb.push(" AND (");
        match clause {
            FilterClause::Compare { field, op, literal } => {
                match (op, literal) {
                    (FilterOp::Contains, Literal::Text(text)) => {
                        qb.push("CAST(");
                        qb.push(field.column());
                        qb.push(" AS TEXT) ILIKE ");
                        qb.push_bind(contains_pattern(text));
                    }
                    (op, Literal::Text(text)) => {
                        qb.push(field.column());
                        qb.push(op.sql());
                        qb.push_bind(text.clone());
                    }
                    (op, Literal::Number(n)) => {
                        qb.push(field.column());
                        qb.push(op.sql());
                        qb.push_bind(*n);
                    }
                    (op, Literal::Date(d)) => {
                        qb.push(field.column());
                        qb.push(op.sql());
                        qb.push_bind(*d);
                    }
                }
            }
            FilterClause::FreeText(text) => {
                let pattern = contains_pattern(text);
                let mut first = true;
                for field in FREE_TEXT_FIELDS {
                    if !first {
                        qb.push(" OR ");
                    }
                    first = false;
                    qb.push(field.column());
                    qb.push(" ILIKE ");
                    qb.push_bind(pattern.clone());
                }
            }
        }
        qb.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_structured_clauses() {
        assert_eq!(
            parse_filter("depto:TI"),
            Some(FilterClause::Compare {
                field: ReportField::Department,
                op: FilterOp::Contains,
                literal: Literal::Text("TI".into()),
            })
        );
        assert_eq!(
            parse_filter(" valor > 500 "),
            Some(FilterClause::Compare {
                field: ReportField::Value,
                op: FilterOp::Greater,
                literal: Literal::Number(Decimal::from(500)),
            })
        );
        assert_eq!(
            parse_filter("acquisition-date<2024-01-01"),
            Some(FilterClause::Compare {
                field: ReportField::AcquisitionDate,
                op: FilterOp::Less,
                literal: Literal::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            })
        );
    }

    #[test]
    fn malformed_literals_drop_only_that_clause() {
        let clauses = parse_filters(&["valor>abc", "fecha_adq=ayer", "depto:TI"]);
        assert_eq!(clauses.len(), 1);
        assert!(matches!(
            clauses[0],
            FilterClause::Compare { field: ReportField::Department, .. }
        ));
    }

    #[test]
    fn unknown_keys_and_bare_words_are_free_text() {
        assert_eq!(parse_filter("laptop"), Some(FilterClause::FreeText("laptop".into())));
        assert_eq!(parse_filter("color:rojo"), Some(FilterClause::FreeText("color:rojo".into())));
        assert_eq!(parse_filter("depto:"), Some(FilterClause::FreeText("depto:".into())));
        assert_eq!(parse_filter("   "), None);
    }

    #[test]
    fn sql_keeps_clause_order_and_binds() {
        let clauses = parse_filters(&["depto:TI", "valor>500", "laptop"]);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM assets a WHERE TRUE");
        push_clauses(&mut qb, &clauses);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM assets a WHERE TRUE \
             AND (CAST(d.name AS TEXT) ILIKE $1) \
             AND (a.current_value > $2) \
             AND (a.name ILIKE $3 OR a.internal_code ILIKE $4 OR d.name ILIKE $5 \
             OR ci.name ILIKE $6 OR l.name ILIKE $7 OR s.name ILIKE $8 OR sp.name ILIKE $9)"
        );
    }

    proptest! {
        #[test]
        fn parser_never_panics(input in "\\PC{0,40}") {
            let _ = parse_filter(&input);
        }

        #[test]
        fn numeric_thresholds_parse_to_their_value(threshold in -10_000i64..10_000) {
            for (text, op) in [(format!("valor>{threshold}"), FilterOp::Greater), (format!("value<{threshold}"), FilterOp::Less)] {
                prop_assert_eq!(
                    parse_filter(&text),
                    Some(FilterClause::Compare {
                        field: ReportField::Value,
                        op,
                        literal: Literal::Number(Decimal::from(threshold)),
                    })
                );
            }
        }
    }
}
