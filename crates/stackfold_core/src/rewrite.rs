//! Reference rewriting.
//!
//! Retargets every `Ref`, `GetAtt` and `Sub` reference inside a resource so
//! that it still points at the right thing once the resource has been
//! inlined under a naming prefix. Input trees are never modified; each call
//! returns a rewritten copy.

use regex::Regex;
use serde_yaml::{Mapping, Value};
use stackfold_yaml::{Intrinsic, Payload, TaggedNode};

use crate::context::RewriteContext;
use crate::error::StackResult;
use crate::template::ResourceDef;

const DEPENDS_ON: &str = "DependsOn";
const PROPERTIES: &str = "Properties";

/// Rewrites references in resource definitions against a [`RewriteContext`].
pub struct ReferenceRewriter {
    placeholder_pattern: Regex,
}

impl Default for ReferenceRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceRewriter {
    pub fn new() -> Self {
        Self {
            // Match ${name} and ${name.attribute} placeholders
            placeholder_pattern: Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_.]*)\}").unwrap(),
        }
    }

    /// Rewrite a resource's `Properties` and `DependsOn`.
    pub fn rewrite_resource(
        &self,
        def: &ResourceDef,
        ctx: &RewriteContext,
    ) -> StackResult<ResourceDef> {
        let mut rewritten = def.clone();

        if let Some(properties) = def.properties() {
            rewritten.set(PROPERTIES, self.rewrite_properties(properties, ctx)?);
        }
        if let Some(depends_on) = def.get(DEPENDS_ON) {
            rewritten.set(DEPENDS_ON, retarget_depends_on(depends_on, ctx));
        }

        Ok(rewritten)
    }

    /// Return a copy of `properties` with every reference retargeted.
    pub fn rewrite_properties(
        &self,
        properties: &Value,
        ctx: &RewriteContext,
    ) -> StackResult<Value> {
        let mut rewritten = properties.clone();
        self.rewrite_value(&mut rewritten, ctx)?;
        Ok(rewritten)
    }

    fn rewrite_value(&self, value: &mut Value, ctx: &RewriteContext) -> StackResult<()> {
        match value {
            Value::Mapping(map) => self.rewrite_mapping(map, ctx)?,
            Value::Sequence(items) => self.rewrite_items(items, ctx)?,
            Value::Tagged(tagged) => {
                let mut node = TaggedNode::from_tagged(tagged)?;
                self.rewrite_node(&mut node, ctx)?;
                *value = node.into_value();
            }
            _ => {}
        }
        Ok(())
    }

    fn rewrite_mapping(&self, map: &mut Mapping, ctx: &RewriteContext) -> StackResult<()> {
        for (_, value) in map.iter_mut() {
            self.rewrite_value(value, ctx)?;
        }
        Ok(())
    }

    fn rewrite_items(&self, items: &mut [Value], ctx: &RewriteContext) -> StackResult<()> {
        for item in items.iter_mut() {
            self.rewrite_value(item, ctx)?;
        }
        Ok(())
    }

    fn rewrite_payload(&self, payload: &mut Payload, ctx: &RewriteContext) -> StackResult<()> {
        match payload {
            Payload::Scalar(_) => Ok(()),
            Payload::Sequence(items) => self.rewrite_items(items, ctx),
            Payload::Mapping(map) => self.rewrite_mapping(map, ctx),
        }
    }

    fn rewrite_node(&self, node: &mut TaggedNode, ctx: &RewriteContext) -> StackResult<()> {
        // Unevaluated macros carry no references.
        let Some(intrinsic) = node.intrinsic() else {
            return Ok(());
        };

        match intrinsic {
            Intrinsic::Ref => self.rewrite_ref(node.payload_mut(), ctx),
            Intrinsic::GetAtt => self.rewrite_get_att(node.payload_mut(), ctx),
            Intrinsic::Sub => self.rewrite_sub(node.payload_mut(), ctx),
            Intrinsic::And
            | Intrinsic::Condition
            | Intrinsic::Base64
            | Intrinsic::Equals
            | Intrinsic::FindInMap
            | Intrinsic::GetAZs
            | Intrinsic::If
            | Intrinsic::ImportValue
            | Intrinsic::Join
            | Intrinsic::Not
            | Intrinsic::Or
            | Intrinsic::Select
            | Intrinsic::Split => self.rewrite_payload(node.payload_mut(), ctx),
        }
    }

    fn rewrite_ref(&self, payload: &mut Payload, ctx: &RewriteContext) -> StackResult<()> {
        match payload {
            Payload::Scalar(target) => {
                *target = ctx.retarget_path(target);
                Ok(())
            }
            other => self.rewrite_payload(other, ctx),
        }
    }

    fn rewrite_get_att(&self, payload: &mut Payload, ctx: &RewriteContext) -> StackResult<()> {
        match payload {
            Payload::Scalar(path) => {
                *path = ctx.retarget_path(path);
                Ok(())
            }
            Payload::Sequence(items) => {
                if let Some(Value::String(resource)) = items.first_mut() {
                    *resource = ctx.retarget(resource);
                }
                self.rewrite_items(items, ctx)
            }
            other => self.rewrite_payload(other, ctx),
        }
    }

    fn rewrite_sub(&self, payload: &mut Payload, ctx: &RewriteContext) -> StackResult<()> {
        match payload {
            Payload::Scalar(expression) => {
                *expression = self.rewrite_sub_expression(expression, &Mapping::new(), ctx);
                Ok(())
            }
            Payload::Sequence(items) => {
                let local = items
                    .get(1)
                    .and_then(Value::as_mapping)
                    .cloned()
                    .unwrap_or_default();
                if let Some(Value::String(expression)) = items.first_mut() {
                    *expression = self.rewrite_sub_expression(expression, &local, ctx);
                }
                if let Some(rest) = items.get_mut(1..) {
                    self.rewrite_items(rest, ctx)?;
                }
                Ok(())
            }
            Payload::Mapping(map) => self.rewrite_mapping(map, ctx),
        }
    }

    /// Retarget the placeholders of a `Sub` expression.
    ///
    /// Names bound locally by the `Sub` or supplied as stack parameters stay
    /// as they are; everything else gets the naming prefix. Text outside the
    /// placeholders, and placeholders escaped with a backslash, is copied
    /// verbatim.
    pub fn rewrite_sub_expression(
        &self,
        expression: &str,
        local: &Mapping,
        ctx: &RewriteContext,
    ) -> String {
        let mut rewritten = String::with_capacity(expression.len());
        let mut previous_end = 0;

        for captures in self.placeholder_pattern.captures_iter(expression) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if is_escaped(expression, whole.start()) {
                continue;
            }

            let (pointer, rest) = match inner.as_str().split_once('.') {
                Some((pointer, rest)) => (pointer, Some(rest)),
                None => (inner.as_str(), None),
            };
            let target = if local.contains_key(pointer) {
                pointer.to_string()
            } else {
                ctx.retarget(pointer)
            };

            rewritten.push_str(&expression[previous_end..whole.start()]);
            rewritten.push_str("${");
            rewritten.push_str(&target);
            if let Some(rest) = rest {
                rewritten.push('.');
                rewritten.push_str(rest);
            }
            rewritten.push('}');
            previous_end = whole.end();
        }

        rewritten.push_str(&expression[previous_end..]);
        rewritten
    }
}

/// Whether the character at `index` follows an odd run of backslashes.
fn is_escaped(text: &str, index: usize) -> bool {
    let backslashes = text[..index]
        .bytes()
        .rev()
        .take_while(|b| *b == b'\\')
        .count();
    backslashes % 2 == 1
}

fn retarget_depends_on(depends_on: &Value, ctx: &RewriteContext) -> Value {
    match depends_on {
        Value::String(name) => Value::String(ctx.prefixed(name)),
        Value::Sequence(names) => Value::Sequence(
            names
                .iter()
                .map(|name| retarget_depends_on(name, ctx))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackfold_yaml::{to_plain_data, LoadScope, TemplateLoader};

    fn parse(text: &str) -> Value {
        TemplateLoader::new()
            .load_str(text, &LoadScope::default())
            .unwrap()
    }

    fn child(bindings: &[&str]) -> RewriteContext {
        let mut map = Mapping::new();
        for name in bindings {
            map.insert(Value::from(*name), Value::from("bound"));
        }
        RewriteContext::nested("child.yaml", map, "Child")
    }

    fn rewrite(text: &str, ctx: &RewriteContext) -> serde_json::Value {
        let rewritten = ReferenceRewriter::new()
            .rewrite_properties(&parse(text), ctx)
            .unwrap();
        to_plain_data(&rewritten).unwrap()
    }

    #[test]
    fn test_ref_is_prefixed() {
        assert_eq!(
            rewrite("Table: !Ref Table\n", &child(&[])),
            json!({"Table": {"Ref": "ChildTable"}})
        );
    }

    #[test]
    fn test_ref_to_bound_parameter_is_kept() {
        assert_eq!(
            rewrite("Env: !Ref Env\n", &child(&["Env"])),
            json!({"Env": {"Ref": "Env"}})
        );
    }

    #[test]
    fn test_ref_to_pseudo_parameter_is_kept() {
        assert_eq!(
            rewrite("Region: !Ref AWS::Region\n", &child(&[])),
            json!({"Region": {"Ref": "AWS::Region"}})
        );
    }

    #[test]
    fn test_get_att_scalar_and_sequence() {
        let result = rewrite(
            "A: !GetAtt Bucket.Arn\nB: !GetAtt [Queue, QueueName]\nC: !GetAtt Env.Value\n",
            &child(&["Env"]),
        );
        assert_eq!(
            result,
            json!({
                "A": {"Fn::GetAtt": ["ChildBucket", "Arn"]},
                "B": {"Fn::GetAtt": ["ChildQueue", "QueueName"]},
                "C": {"Fn::GetAtt": ["Env", "Value"]},
            })
        );
    }

    #[test]
    fn test_sub_scalar_is_rewritten() {
        assert_eq!(
            rewrite("Arn: !Sub 'arn:${Bucket.Arn}'\n", &child(&[])),
            json!({"Arn": {"Fn::Sub": "arn:${ChildBucket.Arn}"}})
        );
    }

    #[test]
    fn test_sub_keeps_local_and_bound_names() {
        let result = rewrite(
            "Name: !Sub\n  - '${Prefix}-${Env}-${Table}-${AWS::Region}'\n  - Prefix: !Ref Bucket\n",
            &child(&["Env"]),
        );
        assert_eq!(
            result,
            json!({"Name": {"Fn::Sub": [
                "${Prefix}-${Env}-${ChildTable}-${AWS::Region}",
                {"Prefix": {"Ref": "ChildBucket"}}
            ]}})
        );
    }

    #[test]
    fn test_sub_escaped_placeholders_untouched() {
        let rewriter = ReferenceRewriter::new();
        let ctx = child(&[]);
        let local = Mapping::new();

        assert_eq!(
            rewriter.rewrite_sub_expression(r"\${Literal} ${Bucket}", &local, &ctx),
            r"\${Literal} ${ChildBucket}"
        );
        assert_eq!(
            rewriter.rewrite_sub_expression(r"\\${Bucket}", &local, &ctx),
            r"\\${ChildBucket}"
        );
        assert_eq!(
            rewriter.rewrite_sub_expression("${!Literal}-${Bucket}", &local, &ctx),
            "${!Literal}-${ChildBucket}"
        );
    }

    #[test]
    fn test_sub_placeholder_names_may_contain_digits() {
        let rewriter = ReferenceRewriter::new();
        let local = Mapping::new();
        assert_eq!(
            rewriter.rewrite_sub_expression("${Bucket2.Arn}-${S3Logs}", &local, &child(&[])),
            "${ChildBucket2.Arn}-${ChildS3Logs}"
        );
    }

    #[test]
    fn test_sub_first_placeholder_and_trailing_text() {
        let rewriter = ReferenceRewriter::new();
        assert_eq!(
            rewriter.rewrite_sub_expression("${A}/mid/${B.Arn}/tail", &Mapping::new(), &child(&[])),
            "${ChildA}/mid/${ChildB.Arn}/tail"
        );
    }

    #[test]
    fn test_references_inside_other_functions() {
        let result = rewrite(
            "Name: !Join ['-', [!Ref Bucket, !Select [0, [!GetAtt Queue.Arn]]]]\n",
            &child(&[]),
        );
        assert_eq!(
            result,
            json!({"Name": {"Fn::Join": ["-", [
                {"Ref": "ChildBucket"},
                {"Fn::Select": [0, [{"Fn::GetAtt": ["ChildQueue", "Arn"]}]]}
            ]]}})
        );
    }

    #[test]
    fn test_root_context_is_no_op() {
        let text = "A: !Ref Bucket\nB: !Sub '${Bucket.Arn}'\nC: [!GetAtt Bucket.Arn]\n";
        let original = to_plain_data(&parse(text)).unwrap();
        assert_eq!(rewrite(text, &RewriteContext::root("template.yaml")), original);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let properties = parse("A: !Ref Bucket\n");
        let before = properties.clone();
        ReferenceRewriter::new()
            .rewrite_properties(&properties, &child(&[]))
            .unwrap();
        assert_eq!(properties, before);
    }

    #[test]
    fn test_depends_on_is_prefixed() {
        let def = ResourceDef::new("AWS::Lambda::Function");
        let mut def = def.with_properties(parse("Role: !GetAtt Role.Arn\n"));
        def.set(DEPENDS_ON, parse("[Role, Table]"));

        let rewritten = ReferenceRewriter::new()
            .rewrite_resource(&def, &child(&[]))
            .unwrap();
        assert_eq!(
            to_plain_data(rewritten.get(DEPENDS_ON).unwrap()).unwrap(),
            json!(["ChildRole", "ChildTable"])
        );
    }
}
