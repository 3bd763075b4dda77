//! Static structural analysis of the reconstructed unit.

use rustpython_parser::Parse;
use rustpython_parser::ast::{self, Constant, Expr, ExprContext, Stmt};
use tracing::warn;

use crate::core::types::{Routine, StaticFacts};

/// Analyze the unit in a single syntax-tree traversal.
///
/// Comment lines come from a raw text scan because the tree does not keep them.
pub fn analyze(unit: &str) -> StaticFacts {
    let mut analyzer = Analyzer::default();
    match ast::Suite::parse(unit, "<unit>") {
        Ok(suite) => analyzer.visit_body(&suite),
        Err(err) => warn!(err = %err, "reconstructed unit did not parse"),
    }
    analyzer.facts.comment_lines = count_comment_lines(unit);
    analyzer.facts
}

pub fn count_comment_lines(text: &str) -> usize {
    text.lines()
        .filter(|line| line.trim_start().starts_with('#'))
        .count()
}

#[derive(Default)]
struct Analyzer {
    facts: StaticFacts,
    /// Nesting depth inside the roman/binary routine.
    in_roman: usize,
    /// Nesting depth inside the population routine.
    in_population: usize,
}

impl Analyzer {
    fn visit_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_function(
        &mut self,
        name: &str,
        decorators: &[Expr],
        args: &ast::Arguments,
        returns: Option<&Expr>,
        body: &[Stmt],
    ) {
        self.facts.defined_functions.insert(name.to_string());
        self.visit_exprs(decorators);
        self.visit_arguments(args);
        if let Some(returns) = returns {
            self.visit_expr(returns);
        }

        let roman = name == Routine::RomanBinary.function_name();
        let population = name == Routine::Population.function_name();
        self.in_roman += usize::from(roman);
        self.in_population += usize::from(population);
        self.visit_body(body);
        self.in_roman -= usize::from(roman);
        self.in_population -= usize::from(population);
    }

    fn visit_while(&mut self, test: &Expr) {
        if self.in_roman > 0 {
            self.facts.roman_loop = true;
        }
        if self.in_population > 0 {
            self.facts.population_loops += 1;
        }
        if matches!(
            test,
            Expr::Constant(ast::ExprConstant {
                value: Constant::Bool(true),
                ..
            })
        ) {
            self.facts.unconditional_loops += 1;
        }
        self.visit_expr(test);
    }

    fn visit_for(&mut self, target: &Expr, iter: &Expr) {
        if self.in_roman > 0 {
            self.facts.roman_loop = true;
        }
        self.visit_expr(target);
        self.visit_expr(iter);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(def) => self.visit_function(
                def.name.as_str(),
                &def.decorator_list,
                &def.args,
                def.returns.as_deref(),
                &def.body,
            ),
            Stmt::AsyncFunctionDef(def) => self.visit_function(
                def.name.as_str(),
                &def.decorator_list,
                &def.args,
                def.returns.as_deref(),
                &def.body,
            ),
            Stmt::ClassDef(class) => {
                for expr in class.decorator_list.iter().chain(&class.bases) {
                    self.visit_expr(expr);
                }
                for keyword in &class.keywords {
                    self.visit_expr(&keyword.value);
                }
                self.visit_body(&class.body);
            }
            Stmt::While(node) => {
                self.visit_while(&node.test);
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::For(node) => {
                self.visit_for(&node.target, &node.iter);
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::AsyncFor(node) => {
                self.visit_for(&node.target, &node.iter);
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::If(node) => {
                self.visit_expr(&node.test);
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::With(node) => {
                for item in &node.items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_expr(vars);
                    }
                }
                self.visit_body(&node.body);
            }
            Stmt::AsyncWith(node) => {
                for item in &node.items {
                    self.visit_expr(&item.context_expr);
                    if let Some(vars) = &item.optional_vars {
                        self.visit_expr(vars);
                    }
                }
                self.visit_body(&node.body);
            }
            Stmt::Try(node) => {
                self.visit_body(&node.body);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    if let Some(kind) = &handler.type_ {
                        self.visit_expr(kind);
                    }
                    self.visit_body(&handler.body);
                }
                self.visit_body(&node.orelse);
                self.visit_body(&node.finalbody);
            }
            Stmt::TryStar(node) => {
                self.visit_body(&node.body);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    if let Some(kind) = &handler.type_ {
                        self.visit_expr(kind);
                    }
                    self.visit_body(&handler.body);
                }
                self.visit_body(&node.orelse);
                self.visit_body(&node.finalbody);
            }
            Stmt::Match(node) => {
                self.visit_expr(&node.subject);
                for case in &node.cases {
                    if let Some(guard) = &case.guard {
                        self.visit_expr(guard);
                    }
                    self.visit_body(&case.body);
                }
            }
            Stmt::Assign(node) => {
                for target in &node.targets {
                    self.visit_expr(target);
                }
                self.visit_expr(&node.value);
            }
            Stmt::AugAssign(node) => {
                self.visit_expr(&node.target);
                self.visit_expr(&node.value);
            }
            Stmt::AnnAssign(node) => {
                self.visit_expr(&node.target);
                self.visit_expr(&node.annotation);
                if let Some(value) = &node.value {
                    self.visit_expr(value);
                }
            }
            Stmt::Expr(node) => self.visit_expr(&node.value),
            Stmt::Return(node) => {
                if let Some(value) = &node.value {
                    self.visit_expr(value);
                }
            }
            Stmt::Raise(node) => {
                for expr in node.exc.iter().chain(&node.cause) {
                    self.visit_expr(expr);
                }
            }
            Stmt::Assert(node) => self.visit_expr(&node.test),
            _ => {}
        }
    }

    fn visit_exprs(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.visit_expr(expr);
        }
    }

    /// Defaults and annotations are expressions too.
    fn visit_arguments(&mut self, args: &ast::Arguments) {
        for arg in args.posonlyargs.iter().chain(&args.args).chain(&args.kwonlyargs) {
            if let Some(annotation) = &arg.def.annotation {
                self.visit_expr(annotation);
            }
            if let Some(default) = &arg.default {
                self.visit_expr(default);
            }
        }
        for arg in args.vararg.iter().chain(&args.kwarg) {
            if let Some(annotation) = &arg.annotation {
                self.visit_expr(annotation);
            }
        }
    }

    fn visit_generators(&mut self, generators: &[ast::Comprehension]) {
        for generator in generators {
            self.visit_expr(&generator.target);
            self.visit_expr(&generator.iter);
            self.visit_exprs(&generator.ifs);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name(name) => {
                if matches!(name.ctx, ExprContext::Store) {
                    self.facts.assigned_names.insert(name.id.as_str().to_string());
                }
            }
            Expr::Tuple(node) => self.visit_exprs(&node.elts),
            Expr::List(node) => self.visit_exprs(&node.elts),
            Expr::Set(node) => self.visit_exprs(&node.elts),
            Expr::Starred(node) => self.visit_expr(&node.value),
            Expr::NamedExpr(node) => {
                self.visit_expr(&node.target);
                self.visit_expr(&node.value);
            }
            Expr::BoolOp(node) => self.visit_exprs(&node.values),
            Expr::BinOp(node) => {
                self.visit_expr(&node.left);
                self.visit_expr(&node.right);
            }
            Expr::UnaryOp(node) => self.visit_expr(&node.operand),
            Expr::Lambda(node) => {
                self.visit_arguments(&node.args);
                self.visit_expr(&node.body);
            }
            Expr::IfExp(node) => {
                self.visit_expr(&node.test);
                self.visit_expr(&node.body);
                self.visit_expr(&node.orelse);
            }
            Expr::Dict(node) => {
                for key in node.keys.iter().flatten() {
                    self.visit_expr(key);
                }
                self.visit_exprs(&node.values);
            }
            Expr::ListComp(node) => {
                self.visit_generators(&node.generators);
                self.visit_expr(&node.elt);
            }
            Expr::SetComp(node) => {
                self.visit_generators(&node.generators);
                self.visit_expr(&node.elt);
            }
            Expr::GeneratorExp(node) => {
                self.visit_generators(&node.generators);
                self.visit_expr(&node.elt);
            }
            Expr::DictComp(node) => {
                self.visit_generators(&node.generators);
                self.visit_expr(&node.key);
                self.visit_expr(&node.value);
            }
            Expr::Await(node) => self.visit_expr(&node.value),
            Expr::YieldFrom(node) => self.visit_expr(&node.value),
            Expr::Yield(node) => {
                if let Some(value) = &node.value {
                    self.visit_expr(value);
                }
            }
            Expr::Compare(node) => {
                self.visit_expr(&node.left);
                self.visit_exprs(&node.comparators);
            }
            Expr::Call(node) => {
                self.visit_expr(&node.func);
                self.visit_exprs(&node.args);
                for keyword in &node.keywords {
                    self.visit_expr(&keyword.value);
                }
            }
            Expr::JoinedStr(node) => self.visit_exprs(&node.values),
            Expr::FormattedValue(node) => self.visit_expr(&node.value),
            Expr::Attribute(node) => self.visit_expr(&node.value),
            Expr::Subscript(node) => {
                self.visit_expr(&node.value);
                self.visit_expr(&node.slice);
            }
            Expr::Slice(node) => {
                for bound in [&node.lower, &node.upper, &node.step].into_iter().flatten() {
                    self.visit_expr(bound);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_defined_functions_and_assigned_names() {
        let facts = analyze(
            "def main():\n    choice, (left, *rest) = 1, (2, 3)\n    def inner():\n        total = [item for item in rest]\n    obj.attr = 5\n",
        );
        assert!(facts.defined_functions.contains("main"));
        assert!(facts.defined_functions.contains("inner"));
        let names: Vec<_> = facts.assigned_names.iter().map(String::as_str).collect();
        assert_eq!(names, ["choice", "item", "left", "rest", "total"]);
    }

    #[test]
    fn walrus_targets_are_found_in_every_expression_position() {
        let unit = r#"def main(limit=(first := 1), *, flag: (second := 2) = 3) -> (third := 4):
    items[(start := 0):(stop := 2)]
    handler = lambda step=(fourth := 5): step
    class Menu(metaclass=(fifth := type)):
        pass
    try:
        pass
    except* (sixth := ValueError):
        pass
"#;
        let facts = analyze(unit);
        for name in [
            "first", "second", "third", "start", "stop", "fourth", "fifth", "sixth", "handler",
        ] {
            assert!(facts.assigned_names.contains(name), "missing {name}");
        }
    }

    #[test]
    fn counts_population_while_loops() {
        let unit = r#"def show_population():
    while True:
        organisms = input("Start: ")
        if organisms:
            break
    while not rate:
        rate = input("Rate: ")
    while days < 1:
        days = int(input("Days: "))
    for day in range(days):
        print(day)
"#;
        let facts = analyze(unit);
        assert_eq!(facts.population_loops, 3);
        assert_eq!(facts.unconditional_loops, 1);
        assert!(!facts.roman_loop);
    }

    #[test]
    fn any_loop_counts_for_roman_routine() {
        let facts = analyze("def show_roman_binary_number():\n    for digit in '101':\n        print(digit)\n");
        assert!(facts.roman_loop);
        assert_eq!(facts.population_loops, 0);
    }

    #[test]
    fn loops_outside_target_routines_only_count_when_unconditional() {
        let facts =
            analyze("def main():\n    while True:\n        break\n    while 1:\n        break\n");
        assert!(!facts.roman_loop);
        assert_eq!(facts.population_loops, 0);
        assert_eq!(facts.unconditional_loops, 1);
    }

    #[test]
    fn comment_lines_are_counted_from_raw_text() {
        let unit = "# header\ndef main():\n    # step\n    x = 1  # trailing\n      #indented\n";
        assert_eq!(count_comment_lines(unit), 3);
        assert_eq!(analyze(unit).comment_lines, 3);
    }

    #[test]
    fn unparseable_unit_yields_empty_facts() {
        let facts = analyze("def broken(:\n# note\n");
        assert!(facts.defined_functions.is_empty());
        assert_eq!(facts.comment_lines, 1);
    }

    #[test]
    fn empty_unit_has_no_facts() {
        assert_eq!(analyze(""), StaticFacts::default());
    }
}
