//! Predicate expressions and their translation into filter trees.
//!
//! [`Expression`] is a small typed predicate IR built with a fluent DSL:
//!
//! ```
//! use sqlshape_query::Expression;
//!
//! let adult_and_active = Expression::member("Age")
//!     .ge(18)
//!     .and(Expression::member("Status").eq("active"));
//! ```
//!
//! Translation accepts comparisons between one member and one constant,
//! `and`/`or`/`not`, boolean members, boxing conversions, and the
//! `contains`/`starts_with`/`ends_with`/`like`/`in`/`between` calls. Any other
//! node fails with an unsupported-expression error naming the node.

use sqlshape_core::{
    Entity, Error, ExpressionError, ExpressionErrorKind, Field, FieldInfo, Result, Value,
};

use crate::operator::{Conjunction, Operator};
use crate::query_field::QueryField;
use crate::query_group::QueryGroup;

/// A predicate or projection expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Member (property) access by name
    Member(String),

    /// Constant value
    Constant(Value),

    /// Boxing / nullable conversion around an operand
    Convert(Box<Expression>),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },

    /// Logical NOT
    Not(Box<Expression>),

    /// Method call, optionally on a target
    Call {
        method: Method,
        target: Option<Box<Expression>>,
        args: Vec<Expression>,
    },

    /// Anonymous projection `new { a, b }`
    New(Vec<Expression>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Logical AND
    AndAlso,
    /// Logical OR
    OrElse,
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
}

impl BinaryOp {
    /// The comparison operator this maps to, if any.
    const fn comparison(self) -> Option<Operator> {
        match self {
            BinaryOp::Eq => Some(Operator::Equal),
            BinaryOp::Ne => Some(Operator::NotEqual),
            BinaryOp::Lt => Some(Operator::LessThan),
            BinaryOp::Le => Some(Operator::LessThanOrEqual),
            BinaryOp::Gt => Some(Operator::GreaterThan),
            BinaryOp::Ge => Some(Operator::GreaterThanOrEqual),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            BinaryOp::Eq => "Equal",
            BinaryOp::Ne => "NotEqual",
            BinaryOp::Lt => "LessThan",
            BinaryOp::Le => "LessThanOrEqual",
            BinaryOp::Gt => "GreaterThan",
            BinaryOp::Ge => "GreaterThanOrEqual",
            BinaryOp::AndAlso => "AndAlso",
            BinaryOp::OrElse => "OrElse",
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Subtract",
            BinaryOp::Mul => "Multiply",
            BinaryOp::Div => "Divide",
        }
    }
}

/// Methods recognised in predicate calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Contains,
    StartsWith,
    EndsWith,
    Like,
    In,
    Between,
    /// Anything else; always rejected by translation
    Other(String),
}

impl Method {
    fn name(&self) -> &str {
        match self {
            Method::Contains => "Contains",
            Method::StartsWith => "StartsWith",
            Method::EndsWith => "EndsWith",
            Method::Like => "Like",
            Method::In => "In",
            Method::Between => "Between",
            Method::Other(name) => name,
        }
    }
}

impl Expression {
    // ==================== Constructors ====================

    /// Member access.
    pub fn member(name: impl Into<String>) -> Self {
        Expression::Member(name.into())
    }

    /// Constant value.
    pub fn lit(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    /// Projection of several members.
    pub fn new_object(members: Vec<Expression>) -> Self {
        Expression::New(members)
    }

    /// Boxing conversion.
    pub fn convert(self) -> Self {
        Expression::Convert(Box::new(self))
    }

    /// `list.Contains(member)` with a constant list.
    pub fn list_contains(list: impl Into<Value>, member: Expression) -> Self {
        Expression::Call {
            method: Method::Contains,
            target: Some(Box::new(Expression::Constant(list.into()))),
            args: vec![member],
        }
    }

    /// Arbitrary method call.
    pub fn call(self, method: Method, args: Vec<Expression>) -> Self {
        Expression::Call {
            method,
            target: Some(Box::new(self)),
            args,
        }
    }

    fn binary(self, op: BinaryOp, other: impl Into<Expression>) -> Self {
        Expression::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other.into()),
        }
    }

    // ==================== Comparison Operators ====================

    /// Equal to (=)
    pub fn eq(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Not equal to (<>)
    pub fn ne(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Ne, other)
    }

    /// Less than (<)
    pub fn lt(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Less than or equal to (<=)
    pub fn le(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Le, other)
    }

    /// Greater than (>)
    pub fn gt(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Greater than or equal to (>=)
    pub fn ge(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Ge, other)
    }

    // ==================== Logical Operators ====================

    /// Logical AND
    pub fn and(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::AndAlso, other)
    }

    /// Logical OR
    pub fn or(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::OrElse, other)
    }

    /// Logical NOT
    pub fn not(self) -> Self {
        Expression::Not(Box::new(self))
    }

    // ==================== Arithmetic ====================

    /// Addition (+). Not translatable inside predicates.
    pub fn add(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// Subtraction (-). Not translatable inside predicates.
    pub fn sub(self, other: impl Into<Expression>) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    // ==================== Pattern and Set Calls ====================

    /// `member.Contains("x")` → `LIKE '%x%'`
    pub fn contains(self, text: impl Into<String>) -> Self {
        self.call(Method::Contains, vec![Expression::lit(text.into())])
    }

    /// `member.StartsWith("x")` → `LIKE 'x%'`
    pub fn starts_with(self, text: impl Into<String>) -> Self {
        self.call(Method::StartsWith, vec![Expression::lit(text.into())])
    }

    /// `member.EndsWith("x")` → `LIKE '%x'`
    pub fn ends_with(self, text: impl Into<String>) -> Self {
        self.call(Method::EndsWith, vec![Expression::lit(text.into())])
    }

    /// Raw LIKE pattern.
    pub fn like(self, pattern: impl Into<String>) -> Self {
        self.call(Method::Like, vec![Expression::lit(pattern.into())])
    }

    /// `IN (...)`
    pub fn in_list(self, values: impl Into<Value>) -> Self {
        self.call(Method::In, vec![Expression::lit(values)])
    }

    /// `BETWEEN low AND high`
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.call(
            Method::Between,
            vec![Expression::lit(low), Expression::lit(high)],
        )
    }

    /// Short description of the node kind, used in errors.
    pub fn node_name(&self) -> String {
        match self {
            Expression::Member(name) => format!("Member({name})"),
            Expression::Constant(_) => "Constant".to_string(),
            Expression::Convert(_) => "Convert".to_string(),
            Expression::Binary { op, .. } => format!("Binary({})", op.name()),
            Expression::Not(_) => "Not".to_string(),
            Expression::Call { method, .. } => format!("Call({})", method.name()),
            Expression::New(_) => "New".to_string(),
        }
    }

    /// Strip boxing conversions.
    fn unwrap_convert(&self) -> &Expression {
        let mut current = self;
        while let Expression::Convert(inner) = current {
            current = inner;
        }
        current
    }

    fn as_member(&self) -> Option<&str> {
        match self.unwrap_convert() {
            Expression::Member(name) => Some(name),
            _ => None,
        }
    }

    fn as_constant(&self) -> Option<&Value> {
        match self.unwrap_convert() {
            Expression::Constant(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Constant(value)
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::Constant(Value::Text(s.to_string()))
    }
}

impl From<String> for Expression {
    fn from(s: String) -> Self {
        Expression::Constant(Value::Text(s))
    }
}

impl From<i32> for Expression {
    fn from(n: i32) -> Self {
        Expression::Constant(Value::Int(n))
    }
}

impl From<i64> for Expression {
    fn from(n: i64) -> Self {
        Expression::Constant(Value::BigInt(n))
    }
}

impl From<bool> for Expression {
    fn from(b: bool) -> Self {
        Expression::Constant(Value::Bool(b))
    }
}

impl From<f64> for Expression {
    fn from(n: f64) -> Self {
        Expression::Constant(Value::Double(n))
    }
}

// ==================== Translation ====================

/// Resolves member names to fields.
pub(crate) type MemberResolver<'a> = dyn Fn(&str) -> Result<Field> + 'a;

/// Resolve members through an entity's metadata; unknown members fail.
pub(crate) fn entity_resolver<E: Entity>(member: &str) -> Result<Field> {
    member_in(E::fields(), E::TABLE_NAME, member)
}

/// Look a member up in a field list by member name or column name.
pub(crate) fn member_in(fields: &[FieldInfo], table: &str, member: &str) -> Result<Field> {
    fields
        .iter()
        .find(|f| f.name == member || f.column_name.eq_ignore_ascii_case(member))
        .map(Field::from_info)
        .ok_or_else(|| {
            Error::Expression(ExpressionError {
                kind: ExpressionErrorKind::UnknownMember,
                node: format!("Member({member})"),
                message: format!("'{member}' is not a member of {table}"),
            })
        })
}

/// Use member names as column names.
pub(crate) fn passthrough_resolver(member: &str) -> Result<Field> {
    Ok(Field::new(member))
}

enum Task<'e> {
    Visit(&'e Expression, bool),
    Combine(Conjunction, bool),
}

/// Translate a predicate into a filter tree.
pub(crate) fn translate(expr: &Expression, resolve: &MemberResolver<'_>) -> Result<QueryGroup> {
    let mut tasks = vec![Task::Visit(expr, false)];
    let mut done: Vec<QueryGroup> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(node, negated) => match node {
                Expression::Binary {
                    left,
                    op: op @ (BinaryOp::AndAlso | BinaryOp::OrElse),
                    right,
                } => {
                    let conjunction = if *op == BinaryOp::AndAlso {
                        Conjunction::And
                    } else {
                        Conjunction::Or
                    };
                    tasks.push(Task::Combine(conjunction, negated));
                    tasks.push(Task::Visit(right, false));
                    tasks.push(Task::Visit(left, false));
                }
                Expression::Not(inner) => tasks.push(Task::Visit(inner, !negated)),
                Expression::Convert(inner) => tasks.push(Task::Visit(inner, negated)),
                leaf => done.push(translate_leaf(leaf, negated, resolve)?),
            },
            Task::Combine(conjunction, negated) => {
                let (Some(right), Some(left)) = (done.pop(), done.pop()) else {
                    return Err(Error::Custom(
                        "expression translation lost an operand".to_string(),
                    ));
                };
                let mut group = QueryGroup::new(conjunction);
                absorb(&mut group, left);
                absorb(&mut group, right);
                group.set_not(negated);
                done.push(group);
            }
        }
    }

    let mut group = done.pop().unwrap_or_default();
    group.fix_parameters();
    Ok(group)
}

/// Merge `child` into `parent`, flattening when it cannot change meaning.
fn absorb(parent: &mut QueryGroup, child: QueryGroup) {
    let members = child.fields().len() + child.groups().len();
    let flatten = !child.is_not() && (child.conjunction() == parent.conjunction() || members <= 1);
    if flatten {
        let (fields, groups) = child.into_parts();
        for field in fields {
            parent.push_field(field);
        }
        for group in groups {
            parent.push_group(group);
        }
    } else {
        parent.push_group(child);
    }
}

fn translate_leaf(
    node: &Expression,
    negated: bool,
    resolve: &MemberResolver<'_>,
) -> Result<QueryGroup> {
    let (member, operator, value) = match node {
        Expression::Binary { left, op, right } => {
            let Some(operator) = op.comparison() else {
                return Err(Error::unsupported_expression(node.node_name()));
            };
            match (left.as_member(), right.as_constant(), left.as_constant(), right.as_member()) {
                (Some(member), Some(value), _, _) => (member, operator, value.clone()),
                (_, _, Some(value), Some(member)) => (member, operator.flip(), value.clone()),
                _ => {
                    let culprit = if left.as_member().is_some() || left.as_constant().is_some() {
                        right
                    } else {
                        left
                    };
                    return Err(Error::unsupported_expression(format!(
                        "{} operand of {}",
                        culprit.node_name(),
                        node.node_name()
                    )));
                }
            }
        }
        Expression::Member(name) => (name.as_str(), Operator::Equal, Value::Bool(true)),
        Expression::Call {
            method,
            target,
            args,
        } => translate_call(node, method, target.as_deref(), args)?,
        other => return Err(Error::unsupported_expression(other.node_name())),
    };

    let field = resolve(member)?;
    let (operator, group_negated) = match (negated, operator.negate()) {
        (false, _) => (operator, false),
        (true, Some(inverse)) => (inverse, false),
        (true, None) => (operator, true),
    };
    let mut group = QueryGroup::and(vec![QueryField::new(field, operator, value)?]);
    group.set_not(group_negated);
    Ok(group)
}

fn translate_call<'e>(
    node: &'e Expression,
    method: &Method,
    target: Option<&'e Expression>,
    args: &'e [Expression],
) -> Result<(&'e str, Operator, Value)> {
    let unsupported = || Error::unsupported_expression(node.node_name());
    let target_member = target.and_then(Expression::as_member);
    let text_arg = || match args {
        [arg] => match arg.as_constant() {
            Some(Value::Text(s)) => Ok(s.as_str()),
            _ => Err(unsupported()),
        },
        _ => Err(unsupported()),
    };

    match method {
        Method::Contains => {
            // `list.Contains(member)` is IN; `member.Contains(text)` is LIKE.
            if let (Some(list @ Value::Array(_)), [arg]) =
                (target.and_then(Expression::as_constant), args)
            {
                let member = arg.as_member().ok_or_else(unsupported)?;
                return Ok((member, Operator::In, list.clone()));
            }
            let member = target_member.ok_or_else(unsupported)?;
            Ok((member, Operator::Like, Value::Text(format!("%{}%", text_arg()?))))
        }
        Method::StartsWith => {
            let member = target_member.ok_or_else(unsupported)?;
            Ok((member, Operator::Like, Value::Text(format!("{}%", text_arg()?))))
        }
        Method::EndsWith => {
            let member = target_member.ok_or_else(unsupported)?;
            Ok((member, Operator::Like, Value::Text(format!("%{}", text_arg()?))))
        }
        Method::Like => {
            let member = target_member.ok_or_else(unsupported)?;
            Ok((member, Operator::Like, Value::Text(text_arg()?.to_string())))
        }
        Method::In => {
            let member = target_member.ok_or_else(unsupported)?;
            match args {
                [arg] => {
                    let list = arg.as_constant().ok_or_else(unsupported)?;
                    Ok((member, Operator::In, list.clone()))
                }
                _ => Err(unsupported()),
            }
        }
        Method::Between => {
            let member = target_member.ok_or_else(unsupported)?;
            match args {
                [low, high] => {
                    let low = low.as_constant().ok_or_else(unsupported)?;
                    let high = high.as_constant().ok_or_else(unsupported)?;
                    Ok((
                        member,
                        Operator::Between,
                        Value::Array(vec![low.clone(), high.clone()]),
                    ))
                }
                _ => Err(unsupported()),
            }
        }
        Method::Other(_) => Err(unsupported()),
    }
}

/// Extract the fields referenced by a member or projection expression.
pub(crate) fn fields_of(expr: &Expression, resolve: &MemberResolver<'_>) -> Result<Vec<Field>> {
    let mut out = Vec::new();
    let mut stack = vec![expr];
    while let Some(node) = stack.pop() {
        match node {
            Expression::Member(name) => out.push(resolve(name)?),
            Expression::Convert(inner) => stack.push(inner),
            Expression::New(members) => stack.extend(members.iter().rev()),
            other => return Err(Error::unsupported_expression(other.node_name())),
        }
    }
    Ok(out)
}

impl QueryGroup {
    /// Translate a predicate over entity `E`; `None` yields an empty group.
    pub fn parse<E: Entity>(expr: Option<&Expression>) -> Result<QueryGroup> {
        match expr {
            Some(expr) => translate(expr, &entity_resolver::<E>),
            None => Ok(QueryGroup::empty()),
        }
    }

    /// Translate a predicate whose members are column names.
    pub fn parse_untyped(expr: Option<&Expression>) -> Result<QueryGroup> {
        match expr {
            Some(expr) => translate(expr, &passthrough_resolver),
            None => Ok(QueryGroup::empty()),
        }
    }
}

/// Fields referenced by a member, conversion or projection over entity `E`.
pub fn parse_fields<E: Entity>(expr: &Expression) -> Result<Vec<Field>> {
    fields_of(expr, &entity_resolver::<E>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlshape_core::{Dialect, SqlType};

    struct Person;

    static PERSON: [FieldInfo; 5] = [
        FieldInfo::new("id", "Id", SqlType::BigInt).primary_key(true),
        FieldInfo::new("age", "Age", SqlType::Integer),
        FieldInfo::new("status", "Status", SqlType::Text),
        FieldInfo::new("name", "Name", SqlType::Text),
        FieldInfo::new("active", "IsActive", SqlType::Boolean),
    ];

    impl Entity for Person {
        const TABLE_NAME: &'static str = "Person";
        fn fields() -> &'static [FieldInfo] {
            &PERSON
        }
    }

    fn m(name: &str) -> Expression {
        Expression::member(name)
    }

    fn render(group: &QueryGroup) -> String {
        group.get_string(&Dialect::SqlServer.setting())
    }

    #[test]
    fn test_round_trip_and() {
        let expr = m("age").ge(18).and(m("status").eq("active"));
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(render(&group), "([Age] >= @Age AND [Status] = @Status)");
        let bag = group.map_parameters().unwrap();
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("Age"), Some(&Value::Int(18)));
        assert_eq!(bag.get("Status"), Some(&Value::from("active")));
    }

    #[test]
    fn test_or_of_and_not_absorbed() {
        let expr = m("age")
            .gt(1)
            .and(m("name").eq("a"))
            .or(m("status").eq("x"));
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(group.conjunction(), Conjunction::Or);
        assert_eq!(
            render(&group),
            "([Status] = @Status OR ([Age] > @Age AND [Name] = @Name))"
        );
    }

    #[test]
    fn test_same_conjunction_flattens() {
        let expr = m("age").gt(1).and(m("name").eq("a")).and(m("status").eq("x"));
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(group.fields().len(), 3);
        assert!(group.groups().is_empty());
    }

    #[test]
    fn test_repeated_member_gets_unique_names() {
        let expr = m("age").ge(18).and(m("age").le(65));
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(render(&group), "([Age] >= @Age AND [Age] <= @Age_1)");
    }

    #[test]
    fn test_constant_on_left_flips() {
        let expr = Expression::lit(18).lt(m("age"));
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(render(&group), "([Age] > @Age)");
    }

    #[test]
    fn test_boolean_member_and_negation() {
        let group = QueryGroup::parse::<Person>(Some(&m("active"))).unwrap();
        assert_eq!(render(&group), "([IsActive] = @IsActive)");

        let group = QueryGroup::parse::<Person>(Some(&m("active").not())).unwrap();
        assert_eq!(render(&group), "([IsActive] <> @IsActive)");
    }

    #[test]
    fn test_not_over_group() {
        let expr = m("age").gt(1).or(m("name").eq("a")).not();
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(render(&group), "NOT ([Age] > @Age OR [Name] = @Name)");
    }

    #[test]
    fn test_convert_is_unwrapped() {
        let expr = m("age").convert().eq(Expression::lit(3).convert());
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(render(&group), "([Age] = @Age)");
    }

    #[test]
    fn test_calls() {
        let group = QueryGroup::parse::<Person>(Some(&m("name").contains("da"))).unwrap();
        assert_eq!(render(&group), "([Name] LIKE @Name)");
        assert_eq!(
            group.map_parameters().unwrap().get("Name"),
            Some(&Value::from("%da%"))
        );

        let group = QueryGroup::parse::<Person>(Some(&m("name").starts_with("A"))).unwrap();
        assert_eq!(
            group.map_parameters().unwrap().get("Name"),
            Some(&Value::from("A%"))
        );

        let expr = Expression::list_contains(vec![1_i64, 2], m("id"));
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(render(&group), "([Id] IN (@Id_In_0, @Id_In_1))");

        let group = QueryGroup::parse::<Person>(Some(&m("age").between(18, 65))).unwrap();
        assert_eq!(render(&group), "([Age] BETWEEN @Age_Left AND @Age_Right)");

        let group =
            QueryGroup::parse::<Person>(Some(&m("age").between(18, 65).not())).unwrap();
        assert_eq!(
            render(&group),
            "([Age] NOT BETWEEN @Age_Left AND @Age_Right)"
        );
    }

    #[test]
    fn test_empty_in_list_fails() {
        let err = QueryGroup::parse::<Person>(Some(&m("id").in_list(Vec::<i64>::new())))
            .unwrap_err();
        assert_eq!(
            err.operator_kind(),
            Some(sqlshape_core::OperatorErrorKind::EmptyInClause)
        );
    }

    #[test]
    fn test_unsupported_nodes_are_named() {
        let err = QueryGroup::parse::<Person>(Some(&m("age").add(1).eq(5))).unwrap_err();
        assert!(err.to_string().contains("Binary(Add)"), "{err}");

        let err = QueryGroup::parse::<Person>(Some(&m("age").eq(m("id")))).unwrap_err();
        assert!(err.is_input_error());

        let upper = m("name").call(Method::Other("ToUpper".into()), vec![]);
        let err = QueryGroup::parse::<Person>(Some(&upper)).unwrap_err();
        assert!(err.to_string().contains("Call(ToUpper)"), "{err}");

        let err = QueryGroup::parse::<Person>(Some(&Expression::lit(true))).unwrap_err();
        assert!(err.to_string().contains("Constant"), "{err}");
    }

    #[test]
    fn test_unknown_member() {
        let err = QueryGroup::parse::<Person>(Some(&m("nope").eq(1))).unwrap_err();
        assert!(matches!(
            err,
            Error::Expression(ExpressionError {
                kind: ExpressionErrorKind::UnknownMember,
                ..
            })
        ));
    }

    #[test]
    fn test_null_input_is_empty() {
        let group = QueryGroup::parse::<Person>(None).unwrap();
        assert!(group.is_empty());
        assert_eq!(render(&group), "");
        assert!(group.map_parameters().unwrap().is_empty());
    }

    #[test]
    fn test_untyped_members() {
        let group = QueryGroup::parse_untyped(Some(&m("Whatever").eq(1))).unwrap();
        assert_eq!(render(&group), "([Whatever] = @Whatever)");
    }

    #[test]
    fn test_parse_fields() {
        let fields =
            parse_fields::<Person>(&Expression::new_object(vec![m("id"), m("name").convert()]))
                .unwrap();
        let names: Vec<&str> = fields.iter().map(Field::name).collect();
        assert_eq!(names, ["Id", "Name"]);

        let err = parse_fields::<Person>(&m("id").eq(1)).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_deep_and_chain() {
        let mut expr = m("age").gt(0);
        for i in 1..2_000 {
            expr = expr.and(m("age").gt(i));
        }
        let group = QueryGroup::parse::<Person>(Some(&expr)).unwrap();
        assert_eq!(group.fields().len(), 2_000);
        assert!(render(&group).ends_with("[Age] > @Age_1999)"));
    }
}
