//! Date-part member access (spec §3.3, §4.3): `p.Birthdate.Year` style
//! member access lowers to `YEAR(<col>)` / `MONTH(<col>)` / `DAY(<col>)`.

use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

impl DatePart {
    pub fn sql_function(self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::Month => "MONTH",
            DatePart::Day => "DAY",
        }
    }
}

pub fn year(column: Expr) -> Expr {
    Expr::DatePart {
        part: DatePart::Year,
        column: Box::new(column),
    }
}

pub fn month(column: Expr) -> Expr {
    Expr::DatePart {
        part: DatePart::Month,
        column: Box::new(column),
    }
}

pub fn day(column: Expr) -> Expr {
    Expr::DatePart {
        part: DatePart::Day,
        column: Box::new(column),
    }
}
