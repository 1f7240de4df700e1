use super::catalog::PermissionCatalog;
use super::lexical::scan_lexical;
use crate::error::SourceError;
use crate::models::{ApiCounts, CallSiteEvidence};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, AssignmentTarget, BindingPattern, BindingPatternKind, CallExpression, ChainElement,
    Class, ClassElement, Declaration, ExportDefaultDeclarationKind, Expression, ForStatementInit,
    FormalParameters, Function, NewExpression, ObjectPropertyKind, Program, Statement,
    StaticMemberExpression, VariableDeclaration,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::HashMap;
use std::path::Path;

/// How a file's evidence was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Walked a syntax tree, aliases resolved.
    Structural,
    /// Literal containment over the raw text.
    Lexical,
}

/// API surfaces found in one source file.
#[derive(Debug, Clone)]
pub struct FileScan {
    pub evidence: CallSiteEvidence,
    pub api_counts: ApiCounts,
    pub strategy: ScanStrategy,
    /// Set when parsing failed and the file was downgraded to lexical matching.
    pub parse_error: Option<SourceError>,
}

/// Local binding name -> API path it was initialised with.
///
/// Lives for exactly one file.
#[derive(Debug, Default)]
pub struct AliasTable {
    bindings: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding. The first recorded target for a name wins.
    pub fn bind(&mut self, name: &str, target: String) -> bool {
        if self.bindings.contains_key(name) {
            return false;
        }
        self.bindings.insert(name.to_string(), target);
        true
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Walks an Oxc syntax tree, resolving call sites through the alias table.
struct SourceWalker<'c> {
    catalog: &'c PermissionCatalog,
    aliases: AliasTable,
    evidence: CallSiteEvidence,
    api_counts: ApiCounts,
}

impl<'c> SourceWalker<'c> {
    fn new(catalog: &'c PermissionCatalog) -> Self {
        Self {
            catalog,
            aliases: AliasTable::new(),
            evidence: CallSiteEvidence::new(),
            api_counts: ApiCounts::new(),
        }
    }

    fn finish(self) -> FileScan {
        FileScan {
            evidence: self.evidence,
            api_counts: self.api_counts,
            strategy: ScanStrategy::Structural,
            parse_error: None,
        }
    }

    /// Record an observed surface against the catalog.
    fn record(&mut self, name: &str) {
        let catalog = self.catalog;
        let name = catalog.normalize(name);
        for pattern in catalog.matching_patterns(&name) {
            self.evidence.insert(pattern);
        }
        if let Some(category) = catalog.category_of(&name) {
            self.api_counts.add(category, &name, 1);
        }
    }

    /// Resolve an expression to a dotted name (e.g. "chrome.tabs.create"),
    /// following aliases for identifiers.
    fn resolve_name(&self, expr: &Expression<'_>) -> Option<String> {
        match expr {
            Expression::Identifier(ident) => Some(
                self.aliases
                    .resolve(&ident.name)
                    .map(str::to_string)
                    .unwrap_or_else(|| ident.name.to_string()),
            ),
            Expression::StaticMemberExpression(member) => self.resolve_member(member),
            Expression::ParenthesizedExpression(paren) => self.resolve_name(&paren.expression),
            _ => None,
        }
    }

    fn resolve_member(&self, member: &StaticMemberExpression<'_>) -> Option<String> {
        let object = self.resolve_name(&member.object)?;
        Some(format!("{}.{}", object, member.property.name))
    }

    /// Visit the parts of a reference chain that are not themselves names,
    /// e.g. the call in `getApi().tabs`.
    fn visit_reference_parts(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::Identifier(_) => {}
            Expression::StaticMemberExpression(member) => {
                self.visit_reference_parts(&member.object);
            }
            Expression::ParenthesizedExpression(paren) => {
                self.visit_reference_parts(&paren.expression);
            }
            other => self.visit_expression(other),
        }
    }

    fn visit_program(&mut self, program: &Program<'_>) {
        self.visit_statements(&program.body);
    }

    fn visit_statements(&mut self, stmts: &[Statement<'_>]) {
        for stmt in stmts {
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::ExpressionStatement(expr_stmt) => {
                self.visit_expression(&expr_stmt.expression);
            }
            Statement::VariableDeclaration(var_decl) => {
                self.visit_variable_declaration(var_decl);
            }
            Statement::FunctionDeclaration(func) => self.visit_function(func),
            Statement::ClassDeclaration(class) => self.visit_class(class),
            Statement::BlockStatement(block) => self.visit_statements(&block.body),
            Statement::IfStatement(if_stmt) => {
                self.visit_expression(&if_stmt.test);
                self.visit_statement(&if_stmt.consequent);
                if let Some(ref alt) = if_stmt.alternate {
                    self.visit_statement(alt);
                }
            }
            Statement::WhileStatement(while_stmt) => {
                self.visit_expression(&while_stmt.test);
                self.visit_statement(&while_stmt.body);
            }
            Statement::DoWhileStatement(do_while) => {
                self.visit_statement(&do_while.body);
                self.visit_expression(&do_while.test);
            }
            Statement::ForStatement(for_stmt) => {
                if let Some(ref init) = for_stmt.init {
                    match init {
                        ForStatementInit::VariableDeclaration(var_decl) => {
                            self.visit_variable_declaration(var_decl);
                        }
                        other => {
                            if let Some(expr) = other.as_expression() {
                                self.visit_expression(expr);
                            }
                        }
                    }
                }
                if let Some(ref test) = for_stmt.test {
                    self.visit_expression(test);
                }
                if let Some(ref update) = for_stmt.update {
                    self.visit_expression(update);
                }
                self.visit_statement(&for_stmt.body);
            }
            Statement::ForInStatement(for_in) => {
                self.visit_expression(&for_in.right);
                self.visit_statement(&for_in.body);
            }
            Statement::ForOfStatement(for_of) => {
                self.visit_expression(&for_of.right);
                self.visit_statement(&for_of.body);
            }
            Statement::SwitchStatement(switch) => {
                self.visit_expression(&switch.discriminant);
                for case in &switch.cases {
                    if let Some(ref test) = case.test {
                        self.visit_expression(test);
                    }
                    self.visit_statements(&case.consequent);
                }
            }
            Statement::LabeledStatement(labeled) => self.visit_statement(&labeled.body),
            Statement::WithStatement(with) => {
                self.visit_expression(&with.object);
                self.visit_statement(&with.body);
            }
            Statement::ReturnStatement(ret) => {
                if let Some(ref arg) = ret.argument {
                    self.visit_expression(arg);
                }
            }
            Statement::ThrowStatement(throw) => self.visit_expression(&throw.argument),
            Statement::TryStatement(try_stmt) => {
                self.visit_statements(&try_stmt.block.body);
                if let Some(ref handler) = try_stmt.handler {
                    if let Some(ref param) = handler.param {
                        self.visit_binding_pattern(&param.pattern);
                    }
                    self.visit_statements(&handler.body.body);
                }
                if let Some(ref finalizer) = try_stmt.finalizer {
                    self.visit_statements(&finalizer.body);
                }
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(ref decl) = export.declaration {
                    self.visit_declaration(decl);
                }
            }
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => self.visit_function(func),
                ExportDefaultDeclarationKind::ClassDeclaration(class) => self.visit_class(class),
                other => {
                    if let Some(expr) = other.as_expression() {
                        self.visit_expression(expr);
                    }
                }
            },
            // Imports, empty/debugger/break/continue and TypeScript-only
            // statements contribute nothing.
            _ => {}
        }
    }

    fn visit_declaration(&mut self, decl: &Declaration<'_>) {
        match decl {
            Declaration::VariableDeclaration(var_decl) => self.visit_variable_declaration(var_decl),
            Declaration::FunctionDeclaration(func) => self.visit_function(func),
            Declaration::ClassDeclaration(class) => self.visit_class(class),
            _ => {}
        }
    }

    /// Initializers are visited first. A binding whose initializer resolves to
    /// a catalogued path is remembered as an alias: `const t = chrome.tabs`
    /// binds `t`, `const {tabs} = chrome` binds `tabs` to `chrome.tabs`.
    fn visit_variable_declaration(&mut self, var_decl: &VariableDeclaration<'_>) {
        for decl in &var_decl.declarations {
            let Some(ref init) = decl.init else {
                self.visit_binding_pattern(&decl.id);
                continue;
            };
            self.visit_expression(init);
            self.visit_binding_pattern(&decl.id);

            let Some(base) = self.resolve_name(init) else {
                continue;
            };
            match &decl.id.kind {
                BindingPatternKind::BindingIdentifier(ident) => self.bind_alias(&ident.name, &base),
                BindingPatternKind::ObjectPattern(object) => {
                    for prop in &object.properties {
                        if prop.computed {
                            continue;
                        }
                        let Some(key) = prop.key.static_name() else {
                            continue;
                        };
                        let local = match &prop.value.kind {
                            BindingPatternKind::BindingIdentifier(ident) => ident,
                            BindingPatternKind::AssignmentPattern(assign) => match &assign.left.kind {
                                BindingPatternKind::BindingIdentifier(ident) => ident,
                                _ => continue,
                            },
                            _ => continue,
                        };
                        self.bind_alias(&local.name, &format!("{}.{}", base, key));
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_alias(&mut self, name: &str, target: &str) {
        let target = self.catalog.normalize(target).into_owned();
        if self.catalog.is_known_path(&target) {
            self.aliases.bind(name, target);
        }
    }

    /// Default values and computed keys inside a binding pattern.
    fn visit_binding_pattern(&mut self, pattern: &BindingPattern<'_>) {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(_) => {}
            BindingPatternKind::AssignmentPattern(assign) => {
                self.visit_binding_pattern(&assign.left);
                self.visit_expression(&assign.right);
            }
            BindingPatternKind::ObjectPattern(object) => {
                for prop in &object.properties {
                    if prop.computed
                        && let Some(key) = prop.key.as_expression()
                    {
                        self.visit_expression(key);
                    }
                    self.visit_binding_pattern(&prop.value);
                }
                if let Some(ref rest) = object.rest {
                    self.visit_binding_pattern(&rest.argument);
                }
            }
            BindingPatternKind::ArrayPattern(array) => {
                for element in array.elements.iter().flatten() {
                    self.visit_binding_pattern(element);
                }
                if let Some(ref rest) = array.rest {
                    self.visit_binding_pattern(&rest.argument);
                }
            }
        }
    }

    fn visit_params(&mut self, params: &FormalParameters<'_>) {
        for param in &params.items {
            self.visit_binding_pattern(&param.pattern);
        }
        if let Some(ref rest) = params.rest {
            self.visit_binding_pattern(&rest.argument);
        }
    }

    fn visit_function(&mut self, func: &Function<'_>) {
        self.visit_params(&func.params);
        if let Some(ref body) = func.body {
            self.visit_statements(&body.statements);
        }
    }

    fn visit_class(&mut self, class: &Class<'_>) {
        if let Some(ref super_class) = class.super_class {
            self.visit_expression(super_class);
        }
        for element in &class.body.body {
            match element {
                ClassElement::MethodDefinition(method) => self.visit_function(&method.value),
                ClassElement::PropertyDefinition(prop) => {
                    if let Some(ref value) = prop.value {
                        self.visit_expression(value);
                    }
                }
                ClassElement::AccessorProperty(prop) => {
                    if let Some(ref value) = prop.value {
                        self.visit_expression(value);
                    }
                }
                ClassElement::StaticBlock(block) => self.visit_statements(&block.body),
                _ => {}
            }
        }
    }

    fn visit_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::CallExpression(call_expr) => self.visit_call_expression(call_expr),
            Expression::NewExpression(new_expr) => self.visit_new_expression(new_expr),
            Expression::StaticMemberExpression(member) => self.visit_static_member(member),
            Expression::ComputedMemberExpression(computed) => {
                self.visit_expression(&computed.object);
                self.visit_expression(&computed.expression);
            }
            Expression::PrivateFieldExpression(private) => {
                self.visit_expression(&private.object);
            }
            Expression::ChainExpression(chain) => match &chain.expression {
                ChainElement::CallExpression(call_expr) => self.visit_call_expression(call_expr),
                ChainElement::StaticMemberExpression(member) => self.visit_static_member(member),
                ChainElement::ComputedMemberExpression(computed) => {
                    self.visit_expression(&computed.object);
                    self.visit_expression(&computed.expression);
                }
                ChainElement::PrivateFieldExpression(private) => {
                    self.visit_expression(&private.object);
                }
                _ => {}
            },
            Expression::ArrowFunctionExpression(arrow) => {
                self.visit_params(&arrow.params);
                self.visit_statements(&arrow.body.statements);
            }
            Expression::FunctionExpression(func) => self.visit_function(func),
            Expression::ClassExpression(class) => self.visit_class(class),
            Expression::AssignmentExpression(assign) => {
                match &assign.left {
                    AssignmentTarget::StaticMemberExpression(member) => {
                        self.visit_static_member(member);
                    }
                    AssignmentTarget::ComputedMemberExpression(computed) => {
                        self.visit_expression(&computed.object);
                        self.visit_expression(&computed.expression);
                    }
                    _ => {}
                }
                self.visit_expression(&assign.right);
            }
            Expression::SequenceExpression(seq) => {
                for expr in &seq.expressions {
                    self.visit_expression(expr);
                }
            }
            Expression::ConditionalExpression(cond) => {
                self.visit_expression(&cond.test);
                self.visit_expression(&cond.consequent);
                self.visit_expression(&cond.alternate);
            }
            Expression::BinaryExpression(bin) => {
                self.visit_expression(&bin.left);
                self.visit_expression(&bin.right);
            }
            Expression::LogicalExpression(log) => {
                self.visit_expression(&log.left);
                self.visit_expression(&log.right);
            }
            Expression::UnaryExpression(unary) => self.visit_expression(&unary.argument),
            Expression::AwaitExpression(await_expr) => {
                self.visit_expression(&await_expr.argument);
            }
            Expression::YieldExpression(yield_expr) => {
                if let Some(ref arg) = yield_expr.argument {
                    self.visit_expression(arg);
                }
            }
            Expression::ParenthesizedExpression(paren) => {
                self.visit_expression(&paren.expression);
            }
            Expression::ObjectExpression(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(prop) => {
                            self.visit_expression(&prop.value);
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.visit_expression(&spread.argument);
                        }
                    }
                }
            }
            Expression::ArrayExpression(arr) => {
                for elem in &arr.elements {
                    if let oxc_ast::ast::ArrayExpressionElement::SpreadElement(spread) = elem {
                        self.visit_expression(&spread.argument);
                    } else if let Some(expr) = elem.as_expression() {
                        self.visit_expression(expr);
                    }
                }
            }
            Expression::TemplateLiteral(tmpl) => {
                for expr in &tmpl.expressions {
                    self.visit_expression(expr);
                }
            }
            Expression::TaggedTemplateExpression(tagged) => {
                self.visit_expression(&tagged.tag);
                for expr in &tagged.quasi.expressions {
                    self.visit_expression(expr);
                }
            }
            // Literals, bare identifiers, `this`, meta properties and the
            // like carry no call surface.
            _ => {}
        }
    }

    fn visit_call_expression(&mut self, call_expr: &CallExpression<'_>) {
        if let Some(name) = self.resolve_name(&call_expr.callee) {
            self.record(&name);
        }
        self.visit_reference_parts(&call_expr.callee);
        self.visit_arguments(&call_expr.arguments);
    }

    fn visit_new_expression(&mut self, new_expr: &NewExpression<'_>) {
        if let Some(name) = self.resolve_name(&new_expr.callee) {
            self.record(&format!("new {}", name));
        }
        self.visit_reference_parts(&new_expr.callee);
        self.visit_arguments(&new_expr.arguments);
    }

    /// A member chain that is read or assigned rather than called,
    /// e.g. `document.cookie`.
    fn visit_static_member(&mut self, member: &StaticMemberExpression<'_>) {
        if let Some(name) = self.resolve_member(member) {
            self.record(&name);
        }
        self.visit_reference_parts(&member.object);
    }

    fn visit_arguments(&mut self, arguments: &[Argument<'_>]) {
        for arg in arguments {
            if let Argument::SpreadElement(spread) = arg {
                self.visit_expression(&spread.argument);
            } else if let Some(expr) = arg.as_expression() {
                self.visit_expression(expr);
            }
        }
    }
}

/// Source types to attempt, most likely first. `.mjs` files are modules,
/// everything else is tried as a classic script first.
fn source_types(path: &Path) -> [SourceType; 2] {
    let is_module = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mjs"));

    if is_module {
        [SourceType::mjs(), SourceType::cjs()]
    } else {
        [SourceType::cjs(), SourceType::mjs()]
    }
}

/// Structural scan of one file. Fails with `SourceError::Parse` when the
/// file parses cleanly neither as a script nor as a module.
pub fn scan_structural(
    content: &str,
    path: &Path,
    catalog: &PermissionCatalog,
) -> Result<FileScan, SourceError> {
    let allocator = Allocator::default();
    let mut message = String::from("parser aborted");

    for source_type in source_types(path) {
        let parser_return = Parser::new(&allocator, content, source_type).parse();

        if !parser_return.panicked && parser_return.errors.is_empty() {
            let mut walker = SourceWalker::new(catalog);
            walker.visit_program(&parser_return.program);
            return Ok(walker.finish());
        }

        if let Some(err) = parser_return.errors.first() {
            message = err.to_string();
        }
    }

    Err(SourceError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Scan one JavaScript file for API surfaces.
///
/// Prefers the structural walk; if parsing fails the file is downgraded to
/// lexical matching and the parse error is reported on the result. Never fails.
pub fn scan_source(content: &str, path: &Path, catalog: &PermissionCatalog) -> FileScan {
    match scan_structural(content, path, catalog) {
        Ok(scan) => scan,
        Err(err) => {
            tracing::debug!("{}, falling back to lexical matching", err);
            let mut scan = scan_lexical(content, catalog);
            scan.parse_error = Some(err);
            scan
        }
    }
}
