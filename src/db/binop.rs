use super::value::{DbType, DbValue};
use crate::parse::{BinOpAst, ParseError, SrcSpan, UnOpAst};

//===========================================================================//

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DbBinOp {
    BoolAnd,
    BoolCmpEq,
    BoolCmpNe,
    BoolOr,
    IntBitAnd,
    IntBitOr,
    IntCmpEq,
    IntCmpGe,
    IntCmpGt,
    IntCmpLe,
    IntCmpLt,
    IntCmpNe,
    IntMinus,
    IntPlus,
}

impl DbBinOp {
    pub(crate) fn typecheck(
        (op_span, op): (SrcSpan, BinOpAst),
        lhs_span: SrcSpan,
        lhs_type: DbType,
        rhs_span: SrcSpan,
        rhs_type: DbType,
    ) -> Result<(DbBinOp, DbType), Vec<ParseError>> {
        use DbType::{Boolean, Integer};
        let binop = match (op, lhs_type, rhs_type) {
            (BinOpAst::And, Boolean, Boolean) => DbBinOp::BoolAnd,
            (BinOpAst::Or, Boolean, Boolean) => DbBinOp::BoolOr,
            (BinOpAst::CmpEq, Boolean, Boolean) => DbBinOp::BoolCmpEq,
            (BinOpAst::CmpNe, Boolean, Boolean) => DbBinOp::BoolCmpNe,
            (BinOpAst::BitAnd, Integer, Integer) => DbBinOp::IntBitAnd,
            (BinOpAst::BitOr, Integer, Integer) => DbBinOp::IntBitOr,
            (BinOpAst::CmpEq, Integer, Integer) => DbBinOp::IntCmpEq,
            (BinOpAst::CmpGe, Integer, Integer) => DbBinOp::IntCmpGe,
            (BinOpAst::CmpGt, Integer, Integer) => DbBinOp::IntCmpGt,
            (BinOpAst::CmpLe, Integer, Integer) => DbBinOp::IntCmpLe,
            (BinOpAst::CmpLt, Integer, Integer) => DbBinOp::IntCmpLt,
            (BinOpAst::CmpNe, Integer, Integer) => DbBinOp::IntCmpNe,
            (BinOpAst::Minus, Integer, Integer) => DbBinOp::IntMinus,
            (BinOpAst::Plus, Integer, Integer) => DbBinOp::IntPlus,
            (op, lhs_type, rhs_type) => {
                let message =
                    format!("Cannot {} {lhs_type} and {rhs_type}", op.verb());
                let label1 = format!("this expression has type {lhs_type}");
                let label2 = format!("this expression has type {rhs_type}");
                return Err(vec![
                    ParseError::new(op_span, message)
                        .with_label(lhs_span, label1)
                        .with_label(rhs_span, label2),
                ]);
            }
        };
        Ok((binop, binop.result_type()))
    }

    fn result_type(self) -> DbType {
        match self {
            DbBinOp::IntBitAnd
            | DbBinOp::IntBitOr
            | DbBinOp::IntMinus
            | DbBinOp::IntPlus => DbType::Integer,
            _ => DbType::Boolean,
        }
    }

    pub(crate) fn evaluate(self, lhs: DbValue, rhs: DbValue) -> DbValue {
        match self {
            DbBinOp::BoolAnd => {
                DbValue::Boolean(lhs.unwrap_bool() && rhs.unwrap_bool())
            }
            DbBinOp::BoolCmpEq => {
                DbValue::Boolean(lhs.unwrap_bool() == rhs.unwrap_bool())
            }
            DbBinOp::BoolCmpNe => {
                DbValue::Boolean(lhs.unwrap_bool() != rhs.unwrap_bool())
            }
            DbBinOp::BoolOr => {
                DbValue::Boolean(lhs.unwrap_bool() || rhs.unwrap_bool())
            }
            DbBinOp::IntBitAnd => {
                DbValue::Integer(lhs.unwrap_int() & rhs.unwrap_int())
            }
            DbBinOp::IntBitOr => {
                DbValue::Integer(lhs.unwrap_int() | rhs.unwrap_int())
            }
            DbBinOp::IntCmpEq => {
                DbValue::Boolean(lhs.unwrap_int() == rhs.unwrap_int())
            }
            DbBinOp::IntCmpGe => {
                DbValue::Boolean(lhs.unwrap_int() >= rhs.unwrap_int())
            }
            DbBinOp::IntCmpGt => {
                DbValue::Boolean(lhs.unwrap_int() > rhs.unwrap_int())
            }
            DbBinOp::IntCmpLe => {
                DbValue::Boolean(lhs.unwrap_int() <= rhs.unwrap_int())
            }
            DbBinOp::IntCmpLt => {
                DbValue::Boolean(lhs.unwrap_int() < rhs.unwrap_int())
            }
            DbBinOp::IntCmpNe => {
                DbValue::Boolean(lhs.unwrap_int() != rhs.unwrap_int())
            }
            DbBinOp::IntMinus => {
                DbValue::Integer(lhs.unwrap_int() - rhs.unwrap_int())
            }
            DbBinOp::IntPlus => {
                DbValue::Integer(lhs.unwrap_int() + rhs.unwrap_int())
            }
        }
    }
}

//===========================================================================//

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DbUnOp {
    BoolNot,
    IntNeg,
}

impl DbUnOp {
    pub(crate) fn typecheck(
        (op_span, op): (SrcSpan, UnOpAst),
        operand_span: SrcSpan,
        operand_type: DbType,
    ) -> Result<(DbUnOp, DbType), Vec<ParseError>> {
        match (op, operand_type) {
            (UnOpAst::Not, DbType::Boolean) => {
                Ok((DbUnOp::BoolNot, DbType::Boolean))
            }
            (UnOpAst::Neg, DbType::Integer) => {
                Ok((DbUnOp::IntNeg, DbType::Integer))
            }
            (op, operand_type) => {
                let message = format!("Cannot {} {operand_type}", op.verb());
                let label =
                    format!("this expression has type {operand_type}");
                Err(vec![
                    ParseError::new(op_span, message)
                        .with_label(operand_span, label),
                ])
            }
        }
    }

    pub(crate) fn evaluate(self, operand: DbValue) -> DbValue {
        match self {
            DbUnOp::BoolNot => DbValue::Boolean(!operand.unwrap_bool()),
            DbUnOp::IntNeg => DbValue::Integer(-operand.unwrap_int()),
        }
    }
}

//===========================================================================//


//===========================================================================//
