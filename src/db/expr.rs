use super::binop::{DbBinOp, DbUnOp};
use super::value::{DbType, DbValue, wrap_u16};
use crate::parse::{
    BinOpAst, ExprAst, ExprAstNode, IdentifierAst, LValueAst, LValueAstNode,
    ParseError, ParseResult, SrcSpan, TokenLexer, UnOpAst, parse_assignment,
    parse_expr,
};
use crate::proc::{Flag, Msp430, register_number};
use num_bigint::BigInt;

//===========================================================================//

const INSN_COUNT_NAME: &str = "insncount";

//===========================================================================//

/// One of the two views of simulated memory that an expression can index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemorySpace {
    /// `byte[ADDR]`: a single byte.
    Byte,
    /// `mem[ADDR]`: a little-endian word.
    Word,
}

impl MemorySpace {
    fn from_identifier(id: &IdentifierAst) -> ParseResult<MemorySpace> {
        match id.name.as_str() {
            "byte" => Ok(MemorySpace::Byte),
            "mem" => Ok(MemorySpace::Word),
            name => {
                let message = format!("No such memory space: `{name}`");
                let label = "expected `mem` or `byte`".to_string();
                Err(vec![
                    ParseError::new(id.span, message)
                        .with_label(id.span, label),
                ])
            }
        }
    }

    fn read(self, cpu: &Msp430, addr: u16) -> u16 {
        match self {
            MemorySpace::Byte => u16::from(cpu.memory().read_byte(addr)),
            MemorySpace::Word => cpu.memory().read_word(addr),
        }
    }

    fn write(self, cpu: &mut Msp430, addr: u16, value: u16) {
        match self {
            MemorySpace::Byte => {
                cpu.memory_mut().write_byte(addr, value as u8)
            }
            MemorySpace::Word => cpu.memory_mut().write_word(addr, value),
        }
    }
}

//===========================================================================//

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum DbOp {
    BinOp(DbBinOp),
    GetFlag(Flag),
    GetInsnCount,
    GetRegister(u8),
    PushValue(DbValue),
    Read(MemorySpace),
    UnOp(DbUnOp),
}

//===========================================================================//

struct DbExprCompiler {
    // Invariant: If the top N entries of `types` all hold `is_static = true`,
    // then the top N entries of `ops` are all `DbOp::PushValue`.
    types: Vec<(DbType, bool)>, // (type, is_static)
    ops: Vec<DbOp>,
    errors: Vec<ParseError>,
}

impl DbExprCompiler {
    fn new() -> DbExprCompiler {
        DbExprCompiler {
            types: Vec::new(),
            ops: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn typecheck(mut self, expr: &ExprAst) -> ParseResult<DbExpr> {
        let mut stack = vec![expr];
        let mut subexprs = Vec::<&ExprAst>::new();
        while let Some(subexpr) = stack.pop() {
            subexprs.push(subexpr);
            match &subexpr.node {
                ExprAstNode::BinOp(_, lhs, rhs) => {
                    stack.push(lhs);
                    stack.push(rhs);
                }
                ExprAstNode::Identifier(_) => {}
                ExprAstNode::Index(_, addr) => stack.push(addr),
                ExprAstNode::IntLiteral(_) => {}
                ExprAstNode::UnOp(_, operand) => stack.push(operand),
            }
        }
        for subexpr in subexprs.into_iter().rev() {
            self.typecheck_subexpr(subexpr);
        }
        debug_assert_eq!(self.types.len(), 1);
        match self.types.pop() {
            Some((ty, _)) if self.errors.is_empty() => {
                Ok(DbExpr { ops: self.ops, ty })
            }
            _ => Err(self.errors),
        }
    }

    fn typecheck_subexpr(&mut self, subexpr: &ExprAst) {
        match &subexpr.node {
            ExprAstNode::BinOp(binop_ast, lhs_ast, rhs_ast) => {
                self.typecheck_binop_node(*binop_ast, lhs_ast, rhs_ast);
            }
            ExprAstNode::Identifier(id) => {
                self.typecheck_identifier(subexpr.span, id);
            }
            ExprAstNode::Index(id, addr_ast) => {
                self.typecheck_index(id, addr_ast);
            }
            ExprAstNode::IntLiteral(value) => {
                let value = DbValue::Integer(value.clone());
                self.ops.push(DbOp::PushValue(value));
                self.types.push((DbType::Integer, true));
            }
            ExprAstNode::UnOp(unop_ast, operand_ast) => {
                self.typecheck_unop_node(*unop_ast, operand_ast);
            }
        }
    }

    fn typecheck_binop_node(
        &mut self,
        binop_ast: (SrcSpan, BinOpAst),
        lhs_ast: &ExprAst,
        rhs_ast: &ExprAst,
    ) {
        let (rhs_type, rhs_static) = self.pop_type();
        let (lhs_type, lhs_static) = self.pop_type();
        if lhs_type == DbType::Bottom || rhs_type == DbType::Bottom {
            self.types.push((DbType::Bottom, false));
            return;
        }
        match DbBinOp::typecheck(
            binop_ast,
            lhs_ast.span,
            lhs_type,
            rhs_ast.span,
            rhs_type,
        ) {
            Ok((binop, result_type)) => {
                if lhs_static && rhs_static {
                    let rhs_value = self.pop_static();
                    let lhs_value = self.pop_static();
                    let result_value = binop.evaluate(lhs_value, rhs_value);
                    self.ops.push(DbOp::PushValue(result_value));
                    self.types.push((result_type, true));
                } else {
                    self.ops.push(DbOp::BinOp(binop));
                    self.types.push((result_type, false));
                }
            }
            Err(mut errs) => {
                self.errors.append(&mut errs);
                self.types.push((DbType::Bottom, false));
            }
        }
    }

    fn typecheck_unop_node(
        &mut self,
        unop_ast: (SrcSpan, UnOpAst),
        operand_ast: &ExprAst,
    ) {
        let (operand_type, operand_static) = self.pop_type();
        if operand_type == DbType::Bottom {
            self.types.push((DbType::Bottom, false));
            return;
        }
        match DbUnOp::typecheck(unop_ast, operand_ast.span, operand_type) {
            Ok((unop, result_type)) => {
                if operand_static {
                    let value = unop.evaluate(self.pop_static());
                    self.ops.push(DbOp::PushValue(value));
                    self.types.push((result_type, true));
                } else {
                    self.ops.push(DbOp::UnOp(unop));
                    self.types.push((result_type, false));
                }
            }
            Err(mut errs) => {
                self.errors.append(&mut errs);
                self.types.push((DbType::Bottom, false));
            }
        }
    }

    fn typecheck_identifier(&mut self, span: SrcSpan, id: &str) {
        if let Some(reg) = register_number(id) {
            self.ops.push(DbOp::GetRegister(reg));
            self.types.push((DbType::Integer, false));
        } else if let Some(flag) = Flag::from_name(id) {
            self.ops.push(DbOp::GetFlag(flag));
            self.types.push((DbType::Boolean, false));
        } else if id == INSN_COUNT_NAME {
            self.ops.push(DbOp::GetInsnCount);
            self.types.push((DbType::Integer, false));
        } else {
            let message = format!("No such identifier: `{id}`");
            let label = "this is not a register or flag name".to_string();
            self.errors
                .push(ParseError::new(span, message).with_label(span, label));
            self.types.push((DbType::Bottom, false));
        }
    }

    fn typecheck_index(&mut self, id: &IdentifierAst, addr_ast: &ExprAst) {
        let (addr_type, _) = self.pop_type();
        let space = match MemorySpace::from_identifier(id) {
            Ok(space) => space,
            Err(mut errs) => {
                self.errors.append(&mut errs);
                self.types.push((DbType::Bottom, false));
                return;
            }
        };
        match addr_type {
            DbType::Bottom => {}
            DbType::Integer => {
                self.ops.push(DbOp::Read(space));
                self.types.push((DbType::Integer, false));
                return;
            }
            DbType::Boolean => {
                self.errors.push(address_type_error(addr_ast.span, addr_type));
            }
        }
        self.types.push((DbType::Bottom, false));
    }

    fn pop_type(&mut self) -> (DbType, bool) {
        self.types.pop().unwrap_or((DbType::Bottom, false))
    }

    fn pop_static(&mut self) -> DbValue {
        match self.ops.pop() {
            Some(DbOp::PushValue(value)) => value,
            op => panic!("pop_static on {op:?}"),
        }
    }
}

fn address_type_error(span: SrcSpan, ty: DbType) -> ParseError {
    let message = format!("memory address must be of type int, not {ty}");
    let label = format!("this expression has type {ty}");
    ParseError::new(span, message).with_label(span, label)
}

//===========================================================================//

/// A typechecked debugger expression, ready to be evaluated against the
/// state of a simulated processor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DbExpr {
    ops: Vec<DbOp>,
    ty: DbType,
}

impl DbExpr {
    /// Parses and typechecks an expression.  Error spans are byte offsets
    /// into `source`.
    pub fn compile(source: &str) -> ParseResult<DbExpr> {
        let tokens = TokenLexer::tokenize(source)?;
        DbExpr::typecheck(&parse_expr(&tokens)?)
    }

    pub(crate) fn typecheck(ast: &ExprAst) -> ParseResult<DbExpr> {
        DbExprCompiler::new().typecheck(ast)
    }

    /// Returns the type of value this expression evaluates to.
    pub fn db_type(&self) -> DbType {
        self.ty
    }

    /// Evaluates this expression against the current processor state.
    pub fn evaluate(&self, cpu: &Msp430) -> DbValue {
        let mut stack = Vec::<DbValue>::with_capacity(self.ops.len());
        for op in &self.ops {
            let value = match op {
                DbOp::BinOp(binop) => {
                    let rhs = pop_value(&mut stack);
                    let lhs = pop_value(&mut stack);
                    binop.evaluate(lhs, rhs)
                }
                &DbOp::GetFlag(flag) => {
                    DbValue::Boolean(cpu.registers().flag(flag))
                }
                DbOp::GetInsnCount => {
                    DbValue::Integer(BigInt::from(cpu.insn_count()))
                }
                &DbOp::GetRegister(reg) => {
                    DbValue::from(cpu.registers().get(reg))
                }
                DbOp::PushValue(value) => value.clone(),
                &DbOp::Read(space) => {
                    let addr = wrap_u16(&pop_value(&mut stack).unwrap_int());
                    DbValue::from(space.read(cpu, addr))
                }
                DbOp::UnOp(unop) => unop.evaluate(pop_value(&mut stack)),
            };
            stack.push(value);
        }
        debug_assert_eq!(stack.len(), 1);
        pop_value(&mut stack)
    }

    fn expect_type(
        &self,
        span: SrcSpan,
        expected: DbType,
        what: &str,
    ) -> ParseResult<()> {
        if self.ty == expected {
            return Ok(());
        }
        let message =
            format!("{what} must be of type {expected}, not {}", self.ty);
        let label = format!("this expression has type {}", self.ty);
        Err(vec![ParseError::new(span, message).with_label(span, label)])
    }
}

fn pop_value(stack: &mut Vec<DbValue>) -> DbValue {
    match stack.pop() {
        Some(value) => value,
        None => panic!("DbExpr evaluation stack underflow"),
    }
}

//===========================================================================//

/// The storage location written by a `set` command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DbTarget {
    /// A status flag.
    Flag(Flag),
    /// A byte or word of memory, at the address computed by the expression.
    Memory(MemorySpace, DbExpr),
    /// A register, by number.
    Register(u8),
}

/// A typechecked `LVALUE = EXPR` assignment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DbAssignment {
    target: DbTarget,
    value: DbExpr,
}

impl DbAssignment {
    /// Parses and typechecks an assignment.  Error spans are byte offsets
    /// into `source`.
    pub fn compile(source: &str) -> ParseResult<DbAssignment> {
        let tokens = TokenLexer::tokenize(source)?;
        let (lvalue, expr_ast) = parse_assignment(&tokens)?;
        let value = DbExpr::typecheck(&expr_ast)?;
        let (target, expected) = DbAssignment::typecheck_target(&lvalue)?;
        value.expect_type(expr_ast.span, expected, "assigned value")?;
        Ok(DbAssignment { target, value })
    }

    fn typecheck_target(
        lvalue: &LValueAst,
    ) -> ParseResult<(DbTarget, DbType)> {
        match &lvalue.node {
            LValueAstNode::Variable(name) => {
                if let Some(reg) = register_number(name) {
                    Ok((DbTarget::Register(reg), DbType::Integer))
                } else if let Some(flag) = Flag::from_name(name) {
                    Ok((DbTarget::Flag(flag), DbType::Boolean))
                } else {
                    let message = format!("Cannot assign to `{name}`");
                    let label =
                        "this is not a register or flag name".to_string();
                    Err(vec![
                        ParseError::new(lvalue.span, message)
                            .with_label(lvalue.span, label),
                    ])
                }
            }
            LValueAstNode::Index(id, addr_ast) => {
                let space = MemorySpace::from_identifier(id)?;
                let addr = DbExpr::typecheck(addr_ast)?;
                if addr.ty != DbType::Integer {
                    return Err(vec![address_type_error(
                        addr_ast.span,
                        addr.ty,
                    )]);
                }
                Ok((DbTarget::Memory(space, addr), DbType::Integer))
            }
        }
    }

    /// Returns the location this assignment writes.
    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    /// Evaluates the right-hand side and stores it.  Integers are truncated
    /// to the width of the target.
    pub fn apply(&self, cpu: &mut Msp430) {
        let value = self.value.evaluate(cpu);
        match &self.target {
            &DbTarget::Flag(flag) => {
                cpu.registers_mut().set_flag(flag, value.unwrap_bool());
            }
            DbTarget::Memory(space, addr) => {
                let addr = wrap_u16(&addr.evaluate(cpu).unwrap_int());
                space.write(cpu, addr, wrap_u16(&value.unwrap_int()));
            }
            &DbTarget::Register(reg) => {
                cpu.registers_mut().set(reg, wrap_u16(&value.unwrap_int()));
            }
        }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{DbAssignment, DbExpr, DbOp, DbTarget, MemorySpace};
    use crate::bus::Ram64k;
    use crate::db::value::{DbType, DbValue};
    use crate::proc::{Flag, Msp430};
    use num_bigint::BigInt;

    fn cpu() -> Msp430 {
        let mut ram = Ram64k::new();
        ram.write_word(0x2000, 0xbeef);
        let mut cpu = Msp430::new(ram);
        cpu.registers_mut().set(4, 0x2000);
        cpu.registers_mut().set_flag(Flag::Zero, true);
        cpu
    }

    fn eval(source: &str) -> DbValue {
        DbExpr::compile(source).unwrap().evaluate(&cpu())
    }

    fn int(value: i64) -> DbValue {
        DbValue::Integer(BigInt::from(value))
    }

    #[test]
    fn literals_are_folded() {
        let expr = DbExpr::compile("1 + 2 - -3").unwrap();
        assert_eq!(expr.ops, vec![DbOp::PushValue(int(6))]);
        assert_eq!(expr.db_type(), DbType::Integer);
        let expr = DbExpr::compile("!(1 == 2)").unwrap();
        assert_eq!(expr.ops, vec![DbOp::PushValue(DbValue::Boolean(true))]);
    }

    #[test]
    fn registers_and_flags() {
        assert_eq!(eval("r4"), int(0x2000));
        assert_eq!(eval("r4 + 1"), int(0x2001));
        assert_eq!(eval("zero"), DbValue::Boolean(true));
        let value = eval("carry || zero && r4 == 0x2000");
        assert_eq!(value, DbValue::Boolean(true));
        assert_eq!(eval("insncount"), int(0));
    }

    #[test]
    fn memory_reads() {
        assert_eq!(eval("mem[r4]"), int(0xbeef));
        assert_eq!(eval("byte[r4]"), int(0xef));
        assert_eq!(eval("byte[r4 + 1]"), int(0xbe));
        assert_eq!(eval("mem[0x12000]"), int(0xbeef));
        assert_eq!(eval("mem[r4] & 0xff00 | 1"), int(0xbe01));
    }

    #[test]
    fn unknown_identifier() {
        let errors = DbExpr::compile("r4 + r16").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "No such identifier: `r16`");
        assert_eq!(errors[0].span.byte_range(), 5..8);
    }

    #[test]
    fn unknown_memory_space() {
        let errors = DbExpr::compile("ram[0]").unwrap_err();
        assert_eq!(errors[0].message, "No such memory space: `ram`");
    }

    #[test]
    fn type_errors() {
        let errors = DbExpr::compile("zero + 1").unwrap_err();
        assert_eq!(errors[0].message, "Cannot add bool and int");
        let errors = DbExpr::compile("mem[carry]").unwrap_err();
        assert_eq!(
            errors[0].message,
            "memory address must be of type int, not bool"
        );
        // Errors do not cascade out of an ill-typed subexpression.
        let errors = DbExpr::compile("(zero + 1) == 2").unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn assign_register() {
        let mut cpu = cpu();
        let assignment = DbAssignment::compile("r5 = r4 - 0x2001").unwrap();
        assert_eq!(assignment.target(), &DbTarget::Register(5));
        assignment.apply(&mut cpu);
        assert_eq!(cpu.registers().get(5), 0xffff);
    }

    #[test]
    fn assign_flag() {
        let mut cpu = cpu();
        DbAssignment::compile("carry = !zero").unwrap().apply(&mut cpu);
        assert!(!cpu.registers().flag(Flag::Carry));
        DbAssignment::compile("carry = r4 > 0").unwrap().apply(&mut cpu);
        assert!(cpu.registers().flag(Flag::Carry));
    }

    #[test]
    fn assign_memory() {
        let mut cpu = cpu();
        let assignment =
            DbAssignment::compile("byte[r4 + 1] = 0x1ff").unwrap();
        assert!(matches!(
            assignment.target(),
            DbTarget::Memory(MemorySpace::Byte, _)
        ));
        assignment.apply(&mut cpu);
        assert_eq!(cpu.memory().read_word(0x2000), 0xffef);
        DbAssignment::compile("mem[r4] = 0x1234").unwrap().apply(&mut cpu);
        assert_eq!(cpu.memory().read_word(0x2000), 0x1234);
    }

    #[test]
    fn bad_assignments() {
        let errors = DbAssignment::compile("zero = 1").unwrap_err();
        assert_eq!(
            errors[0].message,
            "assigned value must be of type bool, not int"
        );
        let errors = DbAssignment::compile("insncount = 1").unwrap_err();
        assert_eq!(errors[0].message, "Cannot assign to `insncount`");
        let errors = DbAssignment::compile("r4 == 1").unwrap_err();
        assert_eq!(errors[0].message, "unexpected '=='");
    }
}

//===========================================================================//
