//! Builds composers from SDL documents.
//!
//! Building runs in passes: every declared type first gets an empty shell
//! (so declarations may refer to each other in any order), then directive
//! definitions are added, then each shell is filled with its fields,
//! arguments, values, interfaces and members. Enums, scalars and input
//! types are filled before the rest.

use async_graphql::Value;
use async_graphql_parser::types as ast;
use async_graphql_parser::{Pos, Positioned, parse_schema};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::Result;
use crate::composers::{ComposerKind, EnumValueConfig, NamedTypeComposer};
use crate::error::ComposeError;
use crate::extensions::{self, Directive};
use crate::names;
use crate::schema::{DirectiveDefinition, SchemaComposer};
use crate::type_ref::TypeReference;

use super::coerce::coerce_const_value;
use super::{
    ArgumentDefinition, EnumTypeConfig, FieldDefinition, InputFieldDef, InputTypeConfig,
    InterfaceTypeConfig, ObjectTypeConfig, ScalarTypeConfig, TypeConfig, TypeMapper,
    UnionTypeConfig,
};

fn parse(sdl: &str) -> Result<ast::ServiceDocument> {
    parse_schema(sdl)
        .map_err(|e| ComposeError::malformed(format!("cannot parse type definitions: {e}")))
}

/// Builds the single type declared by `sdl`.
pub(super) fn build_single_type(
    mapper: &TypeMapper,
    sc: &SchemaComposer,
    sdl: &str,
    register: bool,
) -> Result<NamedTypeComposer> {
    let doc = parse(sdl)?;
    let mut types = Vec::new();
    for definition in doc.definitions {
        match definition {
            ast::TypeSystemDefinition::Type(def) if !def.node.extend => types.push(def.node),
            _ => {
                return Err(ComposeError::malformed(format!(
                    "expected a single type definition in `{sdl}`"
                )));
            }
        }
    }
    let [def] = <[ast::TypeDefinition; 1]>::try_from(types).map_err(|types| {
        ComposeError::malformed(format!(
            "expected a single type definition, found {}",
            types.len()
        ))
    })?;

    let mut builder = DocumentBuilder::new(mapper, sc, sdl, register);
    let tc = builder.declare(&def)?;
    builder.fill(&def, &tc)?;
    Ok(tc)
}

/// Builds and registers every type declared by `sdl`.
pub(super) fn build_document(
    mapper: &TypeMapper,
    sc: &SchemaComposer,
    sdl: &str,
) -> Result<IndexMap<String, NamedTypeComposer>> {
    let doc = parse(sdl)?;
    let mut builder = DocumentBuilder::new(mapper, sc, sdl, true);

    let mut declared = Vec::new();
    for definition in &doc.definitions {
        match definition {
            ast::TypeSystemDefinition::Schema(schema) => check_root_names(&schema.node)?,
            ast::TypeSystemDefinition::Type(def) => {
                let tc = builder.declare(&def.node)?;
                declared.push((&def.node, tc));
            }
            ast::TypeSystemDefinition::Directive(_) => {}
        }
    }

    for definition in &doc.definitions {
        if let ast::TypeSystemDefinition::Directive(def) = definition {
            builder.add_directive_definition(def)?;
        }
    }

    declared.sort_by_key(|(def, _)| fill_rank(&def.kind));
    for (def, tc) in &declared {
        builder.fill(def, tc)?;
    }

    debug!(types = builder.locals.len(), "Added type definitions");
    Ok(builder.locals)
}

fn check_root_names(schema: &ast::SchemaDefinition) -> Result<()> {
    let roots = [
        (&schema.query, names::QUERY),
        (&schema.mutation, names::MUTATION),
        (&schema.subscription, names::SUBSCRIPTION),
    ];
    for (declared, expected) in roots {
        if let Some(name) = declared
            && name.node.as_str() != expected
        {
            return Err(ComposeError::malformed(format!(
                "root type `{}` must be named `{expected}`",
                name.node
            )));
        }
    }
    Ok(())
}

fn ast_kind(kind: &ast::TypeKind) -> ComposerKind {
    match kind {
        ast::TypeKind::Scalar => ComposerKind::Scalar,
        ast::TypeKind::Object(_) => ComposerKind::Object,
        ast::TypeKind::Interface(_) => ComposerKind::Interface,
        ast::TypeKind::Union(_) => ComposerKind::Union,
        ast::TypeKind::Enum(_) => ComposerKind::Enum,
        ast::TypeKind::InputObject(_) => ComposerKind::Input,
    }
}

/// Leaf and input types are filled first so defaults and directive
/// arguments on later types can be checked against them.
fn fill_rank(kind: &ast::TypeKind) -> u8 {
    match kind {
        ast::TypeKind::Enum(_) | ast::TypeKind::Scalar => 0,
        ast::TypeKind::InputObject(_) => 1,
        _ => 2,
    }
}

fn description(description: &Option<Positioned<String>>) -> Option<String> {
    description.as_ref().map(|d| d.node.clone())
}

struct DocumentBuilder<'a> {
    mapper: &'a TypeMapper,
    sc: &'a SchemaComposer,
    sdl: &'a str,
    register: bool,
    locals: IndexMap<String, NamedTypeComposer>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(mapper: &'a TypeMapper, sc: &'a SchemaComposer, sdl: &'a str, register: bool) -> Self {
        Self {
            mapper,
            sc,
            sdl,
            register,
            locals: IndexMap::new(),
        }
    }

    /// Creates (or finds) the composer a declaration or extension writes into.
    fn declare(&mut self, def: &ast::TypeDefinition) -> Result<NamedTypeComposer> {
        let name = def.name.node.to_string();
        let kind = ast_kind(&def.kind);

        if let Some(existing) = self.locals.get(&name) {
            return check_kind(existing.clone(), kind);
        }

        let tc = if def.extend {
            match self.sc.get(&name) {
                Ok(existing) => check_kind(existing, kind)?,
                Err(_) => {
                    trace!(type_name = %name, "Creating placeholder for extension");
                    let tc = self.empty(kind, &name)?;
                    self.sc.add(tc.clone())?;
                    self.sc.mark_placeholder(&name);
                    tc
                }
            }
        } else if self.register
            && (self.sc.take_placeholder(&name) || names::is_root_type_name(&name))
            && let Ok(existing) = self.sc.get(&name)
        {
            check_kind(existing, kind)?
        } else {
            let tc = self.empty(kind, &name)?;
            if self.register {
                self.sc.add(tc.clone())?;
            }
            tc
        };

        self.locals.insert(name, tc.clone());
        Ok(tc)
    }

    fn empty(&self, kind: ComposerKind, name: &str) -> Result<NamedTypeComposer> {
        let config = match kind {
            ComposerKind::Object => TypeConfig::Object(ObjectTypeConfig::new(name)),
            ComposerKind::Input => TypeConfig::Input(InputTypeConfig::new(name)),
            ComposerKind::Enum => TypeConfig::Enum(EnumTypeConfig::new(name)),
            ComposerKind::Scalar => TypeConfig::Scalar(ScalarTypeConfig::new(name)),
            ComposerKind::Interface => TypeConfig::Interface(InterfaceTypeConfig::new(name)),
            ComposerKind::Union => TypeConfig::Union(UnionTypeConfig::new(name)),
        };
        self.mapper.create_from_config(config)
    }

    fn add_directive_definition(&self, positioned: &Positioned<ast::DirectiveDefinition>) -> Result<()> {
        let def = &positioned.node;
        let name = def.name.node.to_string();
        let mut args = IndexMap::new();
        for arg in &def.arguments {
            let arg_name = arg.node.name.node.to_string();
            let config = self
                .mapper
                .convert_arg_config(self.input_value(&arg.node)?)
                .map_err(|e| e.at_path(format!("@{name}({arg_name})")))?;
            args.insert(arg_name, config);
        }
        self.sc.add_directive(DirectiveDefinition {
            name,
            description: description(&def.description),
            args,
            locations: def.locations.iter().map(|l| l.node.clone()).collect(),
            is_repeatable: declares_repeatable(self.sdl, positioned.pos, &def.name.node),
        });
        Ok(())
    }

    fn fill(&self, def: &ast::TypeDefinition, tc: &NamedTypeComposer) -> Result<()> {
        let type_name = tc.get_type_name();
        let desc = description(&def.description);
        let mut directives = self.directives(&def.directives)?;

        match (&def.kind, tc) {
            (ast::TypeKind::Object(object), NamedTypeComposer::Object(otc)) => {
                if let Some(desc) = desc {
                    otc.set_description(desc);
                }
                otc.add_fields(self.output_fields(&object.fields)?)?;
                for iface in &object.implements {
                    otc.add_interface(self.named_ref(iface.node.as_str())?)?;
                }
                append_directives(directives, |d| {
                    otc.add_directive(d);
                });
            }
            (ast::TypeKind::Interface(interface), NamedTypeComposer::Interface(iftc)) => {
                if let Some(desc) = desc {
                    iftc.set_description(desc);
                }
                iftc.add_fields(self.output_fields(&interface.fields)?)?;
                for iface in &interface.implements {
                    iftc.add_interface(self.named_ref(iface.node.as_str())?)?;
                }
                append_directives(directives, |d| {
                    iftc.add_directive(d);
                });
            }
            (ast::TypeKind::InputObject(input), NamedTypeComposer::Input(itc)) => {
                if let Some(desc) = desc {
                    itc.set_description(desc);
                }
                let mut fields = Vec::with_capacity(input.fields.len());
                for field in &input.fields {
                    let name = field.node.name.node.to_string();
                    let def = self
                        .input_value(&field.node)
                        .map_err(|e| e.at_path(format!("{type_name}.{name}")))?;
                    fields.push((name, InputFieldDef::Definition(def)));
                }
                itc.add_fields(fields)?;
                append_directives(directives, |d| {
                    itc.add_directive(d);
                });
            }
            (ast::TypeKind::Enum(enum_type), NamedTypeComposer::Enum(etc)) => {
                if let Some(desc) = desc {
                    etc.set_description(desc);
                }
                let mut values = Vec::with_capacity(enum_type.values.len());
                for value in &enum_type.values {
                    let value_directives = self.directives(&value.node.directives)?;
                    let config = EnumValueConfig {
                        description: description(&value.node.description),
                        deprecation_reason: extensions::deprecation_from_directives(&value_directives),
                        directives: value_directives,
                        ..EnumValueConfig::default()
                    };
                    values.push((value.node.value.node.to_string(), config));
                }
                etc.add_fields(values);
                append_directives(directives, |d| {
                    etc.add_directive(d);
                });
            }
            (ast::TypeKind::Union(union), NamedTypeComposer::Union(utc)) => {
                if let Some(desc) = desc {
                    utc.set_description(desc);
                }
                for member in &union.members {
                    utc.add_type(self.named_ref(member.node.as_str())?)?;
                }
                append_directives(directives, |d| {
                    utc.add_directive(d);
                });
            }
            (ast::TypeKind::Scalar, NamedTypeComposer::Scalar(stc)) => {
                if let Some(desc) = desc {
                    stc.set_description(desc);
                }
                if let Some(position) = directives.iter().position(|d| d.name == "specifiedBy") {
                    let specified_by = directives.remove(position);
                    if let Some(Value::String(url)) = specified_by.get_arg("url") {
                        stc.set_specified_by_url(Some(url.clone()));
                    }
                }
                append_directives(directives, |d| {
                    stc.add_directive(d);
                });
            }
            (kind, other) => {
                return Err(ComposeError::wrong_kind(format!(
                    "cannot write {} definition into {} `{}`",
                    ast_kind(kind),
                    other.kind(),
                    other.get_type_name()
                )));
            }
        }
        Ok(())
    }

    fn output_fields(
        &self,
        fields: &[Positioned<ast::FieldDefinition>],
    ) -> Result<Vec<(String, FieldDefinition)>> {
        fields
            .iter()
            .map(|field| {
                let field = &field.node;
                let mut def = FieldDefinition::new(self.type_from_ast(&field.ty.node)?);
                def.description = description(&field.description);
                def.directives = self.directives(&field.directives)?;
                for arg in &field.arguments {
                    def.args
                        .insert(arg.node.name.node.to_string(), self.input_value(&arg.node)?);
                }
                Ok((field.name.node.to_string(), def))
            })
            .collect()
    }

    fn input_value(&self, value: &ast::InputValueDefinition) -> Result<ArgumentDefinition> {
        let mut def = ArgumentDefinition::new(self.type_from_ast(&value.ty.node)?);
        def.default_value = value.default_value.as_ref().map(|v| v.node.clone());
        def.description = description(&value.description);
        def.directives = self.directives(&value.directives)?;
        Ok(def)
    }

    fn type_from_ast(&self, ty: &ast::Type) -> Result<TypeReference> {
        let inner = match &ty.base {
            ast::BaseType::Named(name) => self.named_ref(name.as_str())?,
            ast::BaseType::List(item) => TypeReference::list(self.type_from_ast(item)?),
        };
        Ok(if ty.nullable {
            inner
        } else {
            TypeReference::non_null(inner)
        })
    }

    /// Document types first, then the registry, then built-in scalars. Any
    /// other name becomes a deferred reference resolved at first use.
    fn named_ref(&self, name: &str) -> Result<TypeReference> {
        if let Some(tc) = self.locals.get(name) {
            return Ok(TypeReference::Named(tc.clone()));
        }
        if let Ok(tc) = self.sc.get(name) {
            return Ok(TypeReference::Named(tc));
        }
        if names::builtin_scalar_description(name).is_some() {
            return Ok(TypeReference::Named(self.sc.get_any_tc(name)?));
        }

        let sc = self.sc.downgrade();
        let target = name.to_string();
        Ok(TypeReference::thunk(
            move || Ok(TypeReference::Named(sc.upgrade()?.get_any_tc(&target)?)),
            Some(name.to_string()),
        ))
    }

    fn directives(&self, directives: &[Positioned<ast::ConstDirective>]) -> Result<Vec<Directive>> {
        directives
            .iter()
            .map(|directive| {
                let mut out = Directive::new(directive.node.name.node.as_str());
                for (name, value) in &directive.node.arguments {
                    out.args.insert(name.node.to_string(), value.node.clone());
                }
                self.coerce_directive_args(&mut out)?;
                Ok(out)
            })
            .collect()
    }

    /// Fills defaults, rejects unknown or missing required arguments and
    /// coerces every value to its declared type, for directives the schema
    /// composer has a definition for.
    fn coerce_directive_args(&self, directive: &mut Directive) -> Result<()> {
        let Some(definition) = self.sc.get_directive(&directive.name) else {
            return Ok(());
        };
        if let Some(unknown) = directive
            .args
            .keys()
            .find(|name| !definition.args.contains_key(name.as_str()))
        {
            return Err(ComposeError::malformed(format!(
                "directive @{} has no argument `{unknown}`",
                directive.name
            )));
        }
        for (name, arg) in &definition.args {
            if directive.args.contains_key(name) {
                continue;
            }
            match &arg.default_value {
                Some(default) => {
                    directive.args.insert(name.clone(), default.clone());
                }
                None if arg.type_.is_non_null()? => {
                    return Err(ComposeError::malformed(format!(
                        "directive @{} is missing required argument `{name}`",
                        directive.name
                    )));
                }
                None => {}
            }
        }
        for (name, value) in directive.args.iter_mut() {
            if let Some(arg) = definition.args.get(name) {
                *value = coerce_const_value(value, &arg.type_)
                    .map_err(|e| e.at_path(format!("@{}({name})", directive.name)))?;
            }
        }
        Ok(())
    }
}

fn check_kind(tc: NamedTypeComposer, expected: ComposerKind) -> Result<NamedTypeComposer> {
    if tc.kind() == expected {
        Ok(tc)
    } else {
        Err(ComposeError::wrong_kind(format!(
            "`{}` is declared as {expected} but already exists as {}",
            tc.get_type_name(),
            tc.kind()
        )))
    }
}

/// Reads the `repeatable` keyword of the directive definition starting at
/// `pos`. The parsed definition always reports itself as repeatable, so the
/// source text between the argument list and `on` is checked instead.
fn declares_repeatable(sdl: &str, pos: Pos, name: &str) -> bool {
    let Some(start) = offset_of(sdl, pos) else {
        return false;
    };
    read_repeatable(&sdl[start..], name).unwrap_or(false)
}

fn read_repeatable(definition: &str, name: &str) -> Option<bool> {
    let mut rest = skip_ignored(definition);
    if rest.starts_with('"') {
        rest = skip_ignored(skip_string(rest)?);
    }
    rest = skip_ignored(rest.strip_prefix("directive")?);
    rest = skip_ignored(rest.strip_prefix('@')?);
    rest = skip_ignored(rest.strip_prefix(name)?);
    if rest.starts_with('(') {
        rest = skip_ignored(after_closing_paren(rest)?);
    }
    let after = rest.strip_prefix("repeatable")?;
    Some(!after.starts_with(|c: char| c == '_' || c.is_ascii_alphanumeric()))
}

/// Byte offset of a 1-based line/column position.
fn offset_of(sdl: &str, pos: Pos) -> Option<usize> {
    let line_start = match pos.line {
        0 | 1 => 0,
        line => sdl.match_indices('\n').nth(line - 2)?.0 + 1,
    };
    sdl[line_start..]
        .char_indices()
        .nth(pos.column.saturating_sub(1))
        .map(|(i, _)| line_start + i)
}

/// Skips whitespace, commas and comments.
fn skip_ignored(mut text: &str) -> &str {
    loop {
        text = text.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '\u{feff}');
        if text.starts_with('#') {
            text = skip_comment(text);
        } else {
            return text;
        }
    }
}

fn skip_comment(text: &str) -> &str {
    text.find('\n').map_or("", |end| &text[end..])
}

/// Skips a string or block string starting at `text`.
fn skip_string(text: &str) -> Option<&str> {
    if let Some(block) = text.strip_prefix("\"\"\"") {
        let end = block.find("\"\"\"")?;
        return Some(&block[end + 3..]);
    }
    let mut chars = text.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return Some(&text[i + 1..]),
            _ => {}
        }
    }
    None
}

/// Returns the text after the parenthesis that closes the one at the start.
fn after_closing_paren(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut rest = text;
    loop {
        let c = rest.chars().next()?;
        match c {
            '"' => {
                rest = skip_string(rest)?;
                continue;
            }
            '#' => {
                rest = skip_comment(rest);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&rest[1..]);
                }
            }
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
}

fn append_directives(directives: Vec<Directive>, mut add: impl FnMut(Directive)) {
    for directive in directives {
        add(directive);
    }
}
