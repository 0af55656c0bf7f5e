use std::collections::HashMap;

use tracing::debug;

use crate::parser::{ClassDef, MethodDef};

use super::Ty;

/// Size in bytes of integers, booleans and addresses.
pub const WORD_SIZE: i32 = 4;

/// A storage slot. Field offsets are relative to the object's base address,
/// parameter and local offsets to the frame pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub name: String,
    pub ty: Ty,
    pub offset: i32,
    pub size: i32,
}

/// Object layout of a class: the parent's layout followed by the class's own
/// fields in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassLayout {
    pub fields: Vec<Slot>,
    pub size: i32,
}

impl ClassLayout {
    /// A field redeclared by a subclass hides the inherited one.
    pub fn field(&self, name: &str) -> Option<&Slot> {
        self.fields.iter().rev().find(|slot| slot.name == name)
    }
}

/// Activation record of one method.
///
/// ```text
///   fp + 4 * (2 + n)   receiver
///   fp + 4 * (2 + i)   parameter i
///   fp + 4             return address
///   fp + 0             saved frame pointer
///   fp - 4 * (1 + j)   local j
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FrameLayout {
    pub params: Vec<Slot>,
    pub locals: Vec<Slot>,
    pub receiver_offset: i32,
}

impl FrameLayout {
    fn new(label: &str, method: &MethodDef) -> Self {
        let mut offset = 2 * WORD_SIZE;
        let mut params = vec![];
        for param in &method.params {
            debug!(method = label, param = %param.name, offset, "parameter slot");
            params.push(Slot {
                name: param.name.clone(),
                ty: Ty::from(&param.ty),
                offset,
                size: WORD_SIZE,
            });
            offset += WORD_SIZE;
        }
        let receiver_offset = offset;

        let mut offset = -WORD_SIZE;
        let mut locals = vec![];
        for (name, ty) in method.local_names() {
            debug!(method = label, local = %name, offset, "local slot");
            locals.push(Slot {
                name: name.clone(),
                ty: Ty::from(ty),
                offset,
                size: WORD_SIZE,
            });
            offset -= WORD_SIZE;
        }

        Self {
            params,
            locals,
            receiver_offset,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.params
            .iter()
            .chain(self.locals.iter())
            .find(|slot| slot.name == name)
    }

    pub fn locals_size(&self) -> i32 {
        self.locals.iter().map(|slot| slot.size).sum()
    }
}

/// Memory layouts, computed the first time a class or method is asked for
/// and never changed afterwards.
#[derive(Clone, Debug, Default)]
pub struct OffsetTable {
    classes: HashMap<String, ClassLayout>,
    frames: HashMap<String, FrameLayout>,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class_layout(&self, name: &str) -> Option<&ClassLayout> {
        self.classes.get(name)
    }

    /// Returns the layout of class `name`, computing it (and the layouts it
    /// depends on) from `classes` if needed. The class hierarchy and the
    /// classes embedded as fields must be acyclic.
    pub fn layout_class(&mut self, classes: &[ClassDef], name: &str) -> &ClassLayout {
        if !self.classes.contains_key(name) {
            let layout = self.compute_class_layout(classes, name);
            self.classes.insert(name.to_string(), layout);
        }
        &self.classes[name]
    }

    fn compute_class_layout(&mut self, classes: &[ClassDef], name: &str) -> ClassLayout {
        let class = classes
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no definition for class {}", name));

        let mut layout = match &class.superclass {
            Some(parent) => self.layout_class(classes, parent).clone(),
            None => ClassLayout::default(),
        };

        for decl in &class.fields {
            let ty = Ty::from(&decl.ty);
            for field in &decl.names {
                let size = match &ty {
                    Ty::Object(embedded) => self.layout_class(classes, embedded).size,
                    _ => WORD_SIZE,
                };
                debug!(class = name, field = %field, offset = layout.size, size, "field slot");
                layout.fields.push(Slot {
                    name: field.clone(),
                    ty: ty.clone(),
                    offset: layout.size,
                    size,
                });
                layout.size += size;
            }
        }

        debug!(class = name, size = layout.size, "class layout");
        layout
    }

    pub fn frame_layout(&self, class: &str, method: &str) -> Option<&FrameLayout> {
        self.frames.get(&method_label(class, method))
    }

    pub fn layout_frame(&mut self, class: &str, method: &MethodDef) -> &FrameLayout {
        let label = method_label(class, &method.name);
        self.frames
            .entry(label)
            .or_insert_with_key(|label| FrameLayout::new(label, method))
    }
}

/// Assembly label of a method body.
pub fn method_label(class: &str, method: &str) -> String {
    format!("{}_{}", class, method)
}
