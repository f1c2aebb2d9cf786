// Nested Relation Writes - create/connect/... operations inside create and update payloads
// Which operations exist depends on the write mode, the cardinality and whether the relation is required

use super::{CreatePayload, UpdatePayload, WriteScope};
use crate::core::FieldPath;
use crate::ent_schema::RelationDescriptor;
use crate::error::ValidationErrorKind;
use crate::framework::context::{one_or_many, ValidationContext};
use crate::framework::record::{expect_bool, expect_object};
use crate::framework::registry::{EntityValidators, ValidatorRegistry};
use crate::framework::unique::UniqueLookup;
use crate::framework::where_filter::FilterExpression;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RelationOperation {
    Create(CreatePayload),
    CreateMany {
        data: Vec<CreatePayload>,
        skip_duplicates: bool,
    },
    Connect(UniqueLookup),
    ConnectOrCreate {
        lookup: UniqueLookup,
        create: CreatePayload,
    },
    /// Replace the whole to-many collection.
    Set(Vec<UniqueLookup>),
    /// `None` unlinks the single row of a to-one relation.
    Disconnect(Option<UniqueLookup>),
    Delete(Option<UniqueLookup>),
    Update {
        lookup: Option<UniqueLookup>,
        data: UpdatePayload,
    },
    UpdateMany {
        filter: FilterExpression,
        data: UpdatePayload,
    },
    DeleteMany(FilterExpression),
    Upsert {
        lookup: Option<UniqueLookup>,
        create: CreatePayload,
        update: UpdatePayload,
    },
}

const CREATE_OPERATIONS: &[&str] = &["create", "createMany", "connect", "connectOrCreate"];
const UPDATE_OPERATIONS: &[&str] = &[
    "create",
    "createMany",
    "connect",
    "connectOrCreate",
    "set",
    "disconnect",
    "delete",
    "update",
    "updateMany",
    "deleteMany",
    "upsert",
];
const TO_MANY_ONLY: &[&str] = &["createMany", "set", "updateMany", "deleteMany"];

/// Validates the nested write object under one relation key.
pub(crate) struct RelationWrite<'r> {
    registry: &'r ValidatorRegistry,
    relation: &'r RelationDescriptor,
    mode: WriteMode,
}

impl<'r> RelationWrite<'r> {
    pub fn new(registry: &'r ValidatorRegistry, relation: &'r RelationDescriptor, mode: WriteMode) -> Self {
        Self {
            registry,
            relation,
            mode,
        }
    }

    fn target(&self) -> &'r EntityValidators {
        self.registry.validators(self.relation.target)
    }

    fn nested_scope(&self) -> WriteScope<'r> {
        WriteScope::nested(&self.relation.inverse)
    }

    pub fn validate(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<Vec<RelationOperation>> {
        ctx.nested_relation(path, |ctx| {
            let object = expect_object(ctx, path, input, &format!("{} relation write", self.relation.target_name))?;
            let allowed = match self.mode {
                WriteMode::Create => CREATE_OPERATIONS,
                WriteMode::Update => UPDATE_OPERATIONS,
            };
            let mut operations = Vec::new();
            let mut ok = true;

            for (key, value) in object {
                let op_path = path.key(key);
                if !allowed.contains(&key.as_str()) {
                    ctx.unknown_field(path, key);
                    ok = false;
                    continue;
                }
                if !self.relation.is_to_many() && TO_MANY_ONLY.contains(&key.as_str()) {
                    ctx.report(&op_path, ValidationErrorKind::invalid_operator(key.as_str(), "to-one relation"));
                    ok = false;
                    continue;
                }
                match self.operation(ctx, &op_path, key, value) {
                    Some(mut produced) => operations.append(&mut produced),
                    None => ok = false,
                }
            }

            ok.then_some(operations)
        })
    }

    fn operation(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        key: &str,
        value: &Value,
    ) -> Option<Vec<RelationOperation>> {
        match key {
            "create" => self.each(ctx, path, value, |ctx, p, v| {
                self.create(ctx, p, v).map(RelationOperation::Create)
            }),
            "createMany" => self.create_many(ctx, path, value).map(|op| vec![op]),
            "connect" => self.each(ctx, path, value, |ctx, p, v| {
                self.lookup(ctx, p, v).map(RelationOperation::Connect)
            }),
            "connectOrCreate" => self.each(ctx, path, value, |ctx, p, v| {
                let object = expect_object(ctx, p, v, "{ where, create }")?;
                let fields = required_keys(ctx, p, object, &["where", "create"], &[])?;
                let lookup = self.lookup(ctx, &p.key("where"), fields[0]);
                let create = self.create(ctx, &p.key("create"), fields[1]);
                Some(RelationOperation::ConnectOrCreate {
                    lookup: lookup?,
                    create: create?,
                })
            }),
            "set" => self
                .many_lookups(ctx, path, value)
                .map(|lookups| vec![RelationOperation::Set(lookups)]),
            "disconnect" => self.unlink(ctx, path, "disconnect", value, RelationOperation::Disconnect),
            "delete" => self.unlink(ctx, path, "delete", value, RelationOperation::Delete),
            "update" => {
                if self.relation.is_to_many() {
                    self.each(ctx, path, value, |ctx, p, v| {
                        let object = expect_object(ctx, p, v, "{ where, data }")?;
                        let fields = required_keys(ctx, p, object, &["where", "data"], &[])?;
                        let lookup = self.lookup(ctx, &p.key("where"), fields[0]);
                        let data = self.update(ctx, &p.key("data"), fields[1], self.nested_scope());
                        Some(RelationOperation::Update {
                            lookup: Some(lookup?),
                            data: data?,
                        })
                    })
                } else {
                    self.update(ctx, path, value, self.nested_scope())
                        .map(|data| vec![RelationOperation::Update { lookup: None, data }])
                }
            }
            "updateMany" => self.each(ctx, path, value, |ctx, p, v| {
                let object = expect_object(ctx, p, v, "{ where, data }")?;
                let fields = required_keys(ctx, p, object, &["where", "data"], &[])?;
                let filter = self.filter(ctx, &p.key("where"), fields[0]);
                let data = self.update(
                    ctx,
                    &p.key("data"),
                    fields[1],
                    WriteScope::scalars_only(&self.relation.inverse),
                );
                Some(RelationOperation::UpdateMany {
                    filter: filter?,
                    data: data?,
                })
            }),
            "deleteMany" => self.each(ctx, path, value, |ctx, p, v| {
                self.filter(ctx, p, v).map(RelationOperation::DeleteMany)
            }),
            "upsert" => self.each(ctx, path, value, |ctx, p, v| {
                let object = expect_object(ctx, p, v, "upsert object")?;
                if self.relation.is_to_many() {
                    let fields = required_keys(ctx, p, object, &["where", "create", "update"], &[])?;
                    let lookup = self.lookup(ctx, &p.key("where"), fields[0]);
                    let create = self.create(ctx, &p.key("create"), fields[1]);
                    let update = self.update(ctx, &p.key("update"), fields[2], self.nested_scope());
                    Some(RelationOperation::Upsert {
                        lookup: Some(lookup?),
                        create: create?,
                        update: update?,
                    })
                } else {
                    let fields = required_keys(ctx, p, object, &["create", "update"], &[])?;
                    let create = self.create(ctx, &p.key("create"), fields[0]);
                    let update = self.update(ctx, &p.key("update"), fields[1], self.nested_scope());
                    Some(RelationOperation::Upsert {
                        lookup: None,
                        create: create?,
                        update: update?,
                    })
                }
            }),
            _ => unreachable!("operation key checked against the allowed set"),
        }
    }

    /// One item for to-one relations, one or many for to-many.
    fn each(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        value: &Value,
        mut f: impl FnMut(&mut ValidationContext<'_>, &FieldPath, &Value) -> Option<RelationOperation>,
    ) -> Option<Vec<RelationOperation>> {
        if !self.relation.is_to_many() {
            return f(ctx, path, value).map(|op| vec![op]);
        }
        let mut out = Vec::new();
        let mut ok = true;
        for (item_path, item) in one_or_many(path, value) {
            match f(ctx, &item_path, item) {
                Some(op) => out.push(op),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    fn create(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<CreatePayload> {
        self.target()
            .create
            .validate(self.registry, ctx, path, value, self.nested_scope())
    }

    fn update(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        value: &Value,
        scope: WriteScope<'_>,
    ) -> Option<UpdatePayload> {
        self.target().update.validate(self.registry, ctx, path, value, scope)
    }

    fn lookup(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<UniqueLookup> {
        let target = self.target();
        target.unique.validate(self.registry, ctx, path, value, &target.filter)
    }

    fn filter(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<FilterExpression> {
        self.target().filter.validate(self.registry, ctx, path, value)
    }

    fn many_lookups(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<Vec<UniqueLookup>> {
        let mut out = Vec::new();
        let mut ok = true;
        for (item_path, item) in one_or_many(path, value) {
            match self.lookup(ctx, &item_path, item) {
                Some(lookup) => out.push(lookup),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }

    /// `createMany: {data, skipDuplicates?}`. Rows are flat, foreign keys included.
    fn create_many(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<RelationOperation> {
        let object = expect_object(ctx, path, value, "{ data, skipDuplicates? }")?;
        let fields = required_keys(ctx, path, object, &["data"], &["skipDuplicates"])?;
        let skip_duplicates = match object.get("skipDuplicates") {
            Some(v) => expect_bool(ctx, &path.key("skipDuplicates"), v),
            None => Some(false),
        };
        let scope = WriteScope::scalars_only(&self.relation.inverse);
        let mut data = Vec::new();
        let mut ok = true;
        for (row_path, row) in one_or_many(&path.key("data"), fields[0]) {
            match self.target().create.validate(self.registry, ctx, &row_path, row, scope) {
                Some(payload) => data.push(payload),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }
        Some(RelationOperation::CreateMany {
            data,
            skip_duplicates: skip_duplicates?,
        })
    }

    /// `disconnect`/`delete`: `true` on nullable to-one relations, unique lookups on to-many.
    fn unlink(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        operation: &str,
        value: &Value,
        make: fn(Option<UniqueLookup>) -> RelationOperation,
    ) -> Option<Vec<RelationOperation>> {
        if self.relation.is_to_many() {
            return self
                .many_lookups(ctx, path, value)
                .map(|lookups| lookups.into_iter().map(|l| make(Some(l))).collect());
        }
        if !self.relation.nullable {
            ctx.report(path, ValidationErrorKind::invalid_operator(operation, "required relation"));
            return None;
        }
        expect_bool(ctx, path, value).map(|unlink| if unlink { vec![make(None)] } else { Vec::new() })
    }
}

/// Check an operation object's keys, returning the required values in order.
fn required_keys<'v>(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    object: &'v Map<String, Value>,
    required: &[&str],
    optional: &[&str],
) -> Option<Vec<&'v Value>> {
    let mut ok = true;
    for key in object.keys() {
        if !required.contains(&key.as_str()) && !optional.contains(&key.as_str()) {
            ctx.unknown_field(path, key);
            ok = false;
        }
    }
    let mut values = Vec::with_capacity(required.len());
    for key in required {
        match object.get(*key) {
            Some(v) => values.push(v),
            None => {
                ctx.report(
                    &path.key(key),
                    ValidationErrorKind::RequiredFieldMissing { field: key.to_string() },
                );
                ok = false;
            }
        }
    }
    ok.then_some(values)
}
