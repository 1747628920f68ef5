//! Deterministic PlantUML / Mermaid renderer.
//!
//! Builds diagram source directly from the request context, with no model
//! call. The same request always renders to the same text.

use archmesh_application::ports::diagram_renderer::{DiagramRenderer, RendererError};
use archmesh_domain::payload::{Component, ComponentKind, IntegrationFlow, Relationship};
use archmesh_domain::{DiagramContext, DiagramFormat, DiagramRequest, DiagramType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDiagramRenderer;

impl TemplateDiagramRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous rendering entry point.
    pub fn render_source(&self, request: &DiagramRequest) -> Result<String, RendererError> {
        let ctx = &request.context;
        let title = request.title.as_str();
        let mut out = String::new();
        match (request.format, request.diagram_type) {
            (DiagramFormat::Plantuml, DiagramType::Context) => plantuml::context(&mut out, title, ctx),
            (DiagramFormat::Plantuml, DiagramType::Container | DiagramType::Component) => {
                plantuml::structure(&mut out, title, request.diagram_type, ctx)
            }
            (DiagramFormat::Plantuml, DiagramType::NfrMapping) => plantuml::nfr(&mut out, title, ctx),
            (DiagramFormat::Plantuml, DiagramType::Sequence) => {
                plantuml::sequence(&mut out, title, require_flow(ctx)?)
            }
            (DiagramFormat::Mermaid, DiagramType::Context) => mermaid::context(&mut out, title, ctx),
            (DiagramFormat::Mermaid, DiagramType::Container | DiagramType::Component) => {
                mermaid::structure(&mut out, title, request.diagram_type, ctx)
            }
            (DiagramFormat::Mermaid, DiagramType::NfrMapping) => mermaid::nfr(&mut out, title, ctx),
            (DiagramFormat::Mermaid, DiagramType::Sequence) => {
                mermaid::sequence(&mut out, title, require_flow(ctx)?)
            }
        }
        .map_err(|e| RendererError::Failed(e.to_string()))?;
        Ok(out)
    }
}

#[async_trait]
impl DiagramRenderer for TemplateDiagramRenderer {
    async fn render(&self, request: &DiagramRequest) -> Result<String, RendererError> {
        self.render_source(request)
    }
}

fn require_flow(ctx: &DiagramContext) -> Result<&IntegrationFlow, RendererError> {
    ctx.flow
        .as_ref()
        .filter(|flow| !flow.steps.is_empty())
        .ok_or_else(|| RendererError::Failed("sequence diagram needs a flow with steps".into()))
}

/// Stable, unique identifiers for display names.
#[derive(Default)]
struct Aliases {
    by_name: HashMap<String, String>,
    order: Vec<(String, String)>,
}

impl Aliases {
    fn get(&mut self, name: &str) -> String {
        if let Some(alias) = self.by_name.get(name) {
            return alias.clone();
        }
        let mut base: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        base = base.trim_matches('_').to_string();
        if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
            base = format!("n_{}", base);
        }
        let mut alias = base.clone();
        let mut n = 2;
        while self.order.iter().any(|(_, a)| *a == alias) {
            alias = format!("{}_{}", base, n);
            n += 1;
        }
        self.by_name.insert(name.to_string(), alias.clone());
        self.order.push((name.to_string(), alias.clone()));
        alias
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

/// Relationship endpoints that are not among the declared components.
fn undeclared_endpoints<'a>(components: &[Component], relationships: &'a [Relationship]) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for rel in relationships {
        for end in [rel.from.as_str(), rel.to.as_str()] {
            if !components.iter().any(|c| c.name == end) && !seen.contains(&end) {
                seen.push(end);
            }
        }
    }
    seen
}

fn component_label(component: &Component) -> String {
    match &component.technology {
        Some(tech) if !tech.trim().is_empty() => format!("{} [{}]", component.name, tech),
        _ => component.name.clone(),
    }
}

fn relationship_label(rel: &Relationship) -> Option<String> {
    let label = match (&rel.protocol, rel.description.trim()) {
        (Some(protocol), "") => protocol.clone(),
        (Some(protocol), desc) => format!("{} ({})", desc, protocol),
        (None, "") => return None,
        (None, desc) => desc.to_string(),
    };
    Some(label)
}

fn system_label(ctx: &DiagramContext) -> &str {
    ctx.system_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("System")
}

mod plantuml {
    use super::*;
    use std::fmt::Result;

    fn quote(text: &str) -> String {
        format!("\"{}\"", text.replace('"', "'").replace('\n', " "))
    }

    fn open(out: &mut String, title: &str) -> Result {
        writeln!(out, "@startuml")?;
        writeln!(out, "title {}", title.replace('\n', " "))
    }

    fn close(out: &mut String) -> Result {
        write!(out, "@enduml")
    }

    fn element(kind: &ComponentKind) -> &'static str {
        match kind {
            ComponentKind::Database => "database",
            ComponentKind::Queue => "queue",
            ComponentKind::Frontend => "boundary",
            ComponentKind::Cache => "collections",
            ComponentKind::External => "cloud",
            ComponentKind::Service | ComponentKind::Other(_) => "component",
        }
    }

    fn relationships(out: &mut String, aliases: &mut Aliases, rels: &[Relationship]) -> Result {
        for rel in rels {
            let from = aliases.get(&rel.from);
            let to = aliases.get(&rel.to);
            match relationship_label(rel) {
                Some(label) => writeln!(out, "{} --> {} : {}", from, to, label.replace('\n', " "))?,
                None => writeln!(out, "{} --> {}", from, to)?,
            }
        }
        Ok(())
    }

    pub(super) fn context(out: &mut String, title: &str, ctx: &DiagramContext) -> Result {
        let mut aliases = Aliases::default();
        open(out, title)?;
        writeln!(out, "left to right direction")?;
        let system = aliases.get(system_label(ctx));
        writeln!(out, "rectangle {} as {}", quote(system_label(ctx)), system)?;
        for actor in &ctx.actors {
            let alias = aliases.get(&actor.name);
            let keyword = if actor.external { "cloud" } else { "actor" };
            writeln!(out, "{} {} as {}", keyword, quote(&actor.name), alias)?;
        }
        for actor in &ctx.actors {
            let alias = aliases.get(&actor.name);
            if actor.description.trim().is_empty() {
                writeln!(out, "{} --> {}", alias, system)?;
            } else {
                writeln!(out, "{} --> {} : {}", alias, system, actor.description.replace('\n', " "))?;
            }
        }
        close(out)
    }

    pub(super) fn structure(
        out: &mut String,
        title: &str,
        diagram_type: DiagramType,
        ctx: &DiagramContext,
    ) -> Result {
        let mut aliases = Aliases::default();
        open(out, title)?;
        let boundary = if diagram_type == DiagramType::Component { "package" } else { "rectangle" };
        writeln!(out, "{} {} {{", boundary, quote(system_label(ctx)))?;
        for component in &ctx.components {
            let alias = aliases.get(&component.name);
            let keyword = if diagram_type == DiagramType::Component {
                "component"
            } else {
                element(&component.kind)
            };
            writeln!(out, "  {} {} as {}", keyword, quote(&component_label(component)), alias)?;
        }
        writeln!(out, "}}")?;
        for name in undeclared_endpoints(&ctx.components, &ctx.relationships) {
            let alias = aliases.get(name);
            writeln!(out, "rectangle {} as {}", quote(name), alias)?;
        }
        relationships(out, &mut aliases, &ctx.relationships)?;
        close(out)
    }

    pub(super) fn nfr(out: &mut String, title: &str, ctx: &DiagramContext) -> Result {
        let mut aliases = Aliases::default();
        open(out, title)?;
        writeln!(out, "left to right direction")?;
        for component in &ctx.components {
            let alias = aliases.get(&component.name);
            writeln!(out, "component {} as {}", quote(&component.name), alias)?;
        }
        for (idx, mapping) in ctx.nfr_mappings.iter().enumerate() {
            writeln!(
                out,
                "rectangle \"{}\\n--\\n{}\" as nfr_{}",
                mapping.requirement.replace('"', "'"),
                mapping.tactic.replace('"', "'"),
                idx + 1
            )?;
        }
        for (idx, mapping) in ctx.nfr_mappings.iter().enumerate() {
            for name in &mapping.components {
                if !aliases.contains(name) {
                    let alias = aliases.get(name);
                    writeln!(out, "component {} as {}", quote(name), alias)?;
                }
                writeln!(out, "nfr_{} ..> {}", idx + 1, aliases.get(name))?;
            }
        }
        close(out)
    }

    pub(super) fn sequence(out: &mut String, title: &str, flow: &IntegrationFlow) -> Result {
        let mut aliases = Aliases::default();
        open(out, title)?;
        for step in &flow.steps {
            for name in [&step.from, &step.to] {
                if !aliases.contains(name) {
                    let alias = aliases.get(name);
                    writeln!(out, "participant {} as {}", quote(name), alias)?;
                }
            }
        }
        for step in &flow.steps {
            writeln!(
                out,
                "{} -> {} : {}",
                aliases.get(&step.from),
                aliases.get(&step.to),
                step.message.replace('\n', " ")
            )?;
        }
        close(out)
    }
}

mod mermaid {
    use super::*;
    use std::fmt::Result;

    fn label(text: &str) -> String {
        text.replace('"', "#quot;").replace('\n', " ")
    }

    fn edge_label(text: &str) -> String {
        label(text).replace('|', "/")
    }

    fn shape(kind: &ComponentKind, alias: &str, text: &str) -> String {
        let text = label(text);
        match kind {
            ComponentKind::Database => format!("{}[(\"{}\")]", alias, text),
            ComponentKind::Queue => format!("{}[[\"{}\"]]", alias, text),
            ComponentKind::Frontend => format!("{}(\"{}\")", alias, text),
            ComponentKind::Cache => format!("{}{{{{\"{}\"}}}}", alias, text),
            ComponentKind::External => format!("{}>\"{}\"]", alias, text),
            ComponentKind::Service | ComponentKind::Other(_) => format!("{}[\"{}\"]", alias, text),
        }
    }

    fn relationships(out: &mut String, aliases: &mut Aliases, rels: &[Relationship]) -> Result {
        for rel in rels {
            let from = aliases.get(&rel.from);
            let to = aliases.get(&rel.to);
            match relationship_label(rel) {
                Some(text) => writeln!(out, "  {} -->|\"{}\"| {}", from, edge_label(&text), to)?,
                None => writeln!(out, "  {} --> {}", from, to)?,
            }
        }
        Ok(())
    }

    pub(super) fn context(out: &mut String, title: &str, ctx: &DiagramContext) -> Result {
        let mut aliases = Aliases::default();
        writeln!(out, "flowchart LR")?;
        writeln!(out, "  %% {}", label(title))?;
        let system = aliases.get(system_label(ctx));
        writeln!(out, "  {}[\"{}\"]", system, label(system_label(ctx)))?;
        for actor in &ctx.actors {
            let alias = aliases.get(&actor.name);
            if actor.external {
                writeln!(out, "  {}>\"{}\"]", alias, label(&actor.name))?;
            } else {
                writeln!(out, "  {}([\"{}\"])", alias, label(&actor.name))?;
            }
        }
        for actor in &ctx.actors {
            let alias = aliases.get(&actor.name);
            if actor.description.trim().is_empty() {
                writeln!(out, "  {} --> {}", alias, system)?;
            } else {
                writeln!(out, "  {} -->|\"{}\"| {}", alias, edge_label(&actor.description), system)?;
            }
        }
        Ok(())
    }

    pub(super) fn structure(
        out: &mut String,
        title: &str,
        diagram_type: DiagramType,
        ctx: &DiagramContext,
    ) -> Result {
        let mut aliases = Aliases::default();
        writeln!(out, "flowchart TB")?;
        writeln!(out, "  %% {}", label(title))?;
        writeln!(out, "  subgraph boundary[\"{}\"]", label(system_label(ctx)))?;
        for component in &ctx.components {
            let alias = aliases.get(&component.name);
            let kind = if diagram_type == DiagramType::Component {
                &ComponentKind::Service
            } else {
                &component.kind
            };
            writeln!(out, "    {}", shape(kind, &alias, &component_label(component)))?;
        }
        writeln!(out, "  end")?;
        for name in undeclared_endpoints(&ctx.components, &ctx.relationships) {
            let alias = aliases.get(name);
            writeln!(out, "  {}", shape(&ComponentKind::External, &alias, name))?;
        }
        relationships(out, &mut aliases, &ctx.relationships)
    }

    pub(super) fn nfr(out: &mut String, title: &str, ctx: &DiagramContext) -> Result {
        let mut aliases = Aliases::default();
        writeln!(out, "flowchart LR")?;
        writeln!(out, "  %% {}", label(title))?;
        for component in &ctx.components {
            let alias = aliases.get(&component.name);
            writeln!(out, "  {}[\"{}\"]", alias, label(&component.name))?;
        }
        for (idx, mapping) in ctx.nfr_mappings.iter().enumerate() {
            writeln!(
                out,
                "  nfr_{}{{{{\"{}: {}\"}}}}",
                idx + 1,
                label(&mapping.requirement),
                label(&mapping.tactic)
            )?;
        }
        for (idx, mapping) in ctx.nfr_mappings.iter().enumerate() {
            for name in &mapping.components {
                if !aliases.contains(name) {
                    let alias = aliases.get(name);
                    writeln!(out, "  {}[\"{}\"]", alias, label(name))?;
                }
                writeln!(out, "  nfr_{} -.-> {}", idx + 1, aliases.get(name))?;
            }
        }
        Ok(())
    }

    pub(super) fn sequence(out: &mut String, title: &str, flow: &IntegrationFlow) -> Result {
        let mut aliases = Aliases::default();
        writeln!(out, "sequenceDiagram")?;
        writeln!(out, "  title {}", label(title))?;
        for step in &flow.steps {
            for name in [&step.from, &step.to] {
                if !aliases.contains(name) {
                    let alias = aliases.get(name);
                    writeln!(out, "  participant {} as {}", alias, label(name))?;
                }
            }
        }
        for step in &flow.steps {
            writeln!(
                out,
                "  {}->>{}: {}",
                aliases.get(&step.from),
                aliases.get(&step.to),
                label(&step.message).replace(';', ",")
            )?;
        }
        Ok(())
    }
}
