use tracing::debug;

use crate::{
    analyzer::{
        method_label, ClassLayout, FrameLayout, OffsetTable, SemanticTables, Slot, WORD_SIZE,
    },
    parser::{BinOpKind, ClassDef, Expr, ExprKind, MethodDef, Program, Stmt, StmtKind, UnaryOpKind},
};

pub const HEAP_BASE: &str = "heap_base";
pub const HEAP_TOP: &str = "heap_top";
pub const PRINT_FORMAT: &str = ".LC0";
pub const PRINT_FUN: &str = "Print";
pub const START_FUN: &str = "Start";

enum Location {
    Frame(Slot),
    Field(Slot),
}

/// Lowers a checked program to 32-bit x86 (AT&T syntax). Every expression
/// leaves exactly one word on the stack.
pub struct Codegen<'a> {
    tables: &'a SemanticTables,
    offsets: OffsetTable,
    label_index: usize,
    out: String,
    current_class: String,
    class_layout: ClassLayout,
    frame: Option<FrameLayout>,
}

impl<'a> Codegen<'a> {
    pub fn new(tables: &'a SemanticTables) -> Self {
        Self {
            tables,
            offsets: OffsetTable::new(),
            label_index: 0,
            out: String::new(),
            current_class: String::new(),
            class_layout: ClassLayout::default(),
            frame: None,
        }
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    pub fn generate(&mut self, program: &Program) -> String {
        self.gen_preamble();
        for class in &program.classes {
            self.gen_class(&program.classes, class);
        }
        let program_size = self.offsets.layout_class(&program.classes, "Program").size;
        self.gen_start(program_size);

        std::mem::take(&mut self.out)
    }

    fn emit(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn new_label(&mut self) -> String {
        let s = format!(".L{:0>3}", self.label_index);
        self.label_index += 1;
        s
    }

    fn frame(&self) -> &FrameLayout {
        self.frame
            .as_ref()
            .expect("expression generated outside of a method")
    }

    fn gen_oneop(&mut self, s: &str) {
        self.emit("  popl %eax");
        self.emit(s);
        self.emit("  pushl %eax");
    }

    fn _gen_binop(&mut self, s: &str) {
        self.emit("  popl %ebx");
        self.emit("  popl %eax");
        self.emit(s);
        self.emit("  pushl %eax");
    }

    fn epilogue(&mut self) {
        self.emit("  movl %ebp, %esp");
        self.emit("  popl %ebp");
        self.emit("  ret");
    }

    fn gen_preamble(&mut self) {
        self.emit("  .text");
        self.emit(&format!("  .comm {},{},{}", HEAP_BASE, WORD_SIZE, WORD_SIZE));
        self.emit(&format!("  .comm {},{},{}", HEAP_TOP, WORD_SIZE, WORD_SIZE));
        self.emit("  .section .rodata");
        self.emit(&format!("{}:", PRINT_FORMAT));
        self.emit("  .string \"%d\\n\"");
        self.emit("  .text");
        self.emit(&format!("  .globl {}", PRINT_FUN));
        self.emit(&format!("  .type {}, @function", PRINT_FUN));
        self.emit(&format!("{}:", PRINT_FUN));
        self.emit("  pushl %ebp");
        self.emit("  movl %esp, %ebp");
        self.emit("  movl 8(%ebp), %eax");
        self.emit("  pushl %eax");
        self.emit(&format!("  pushl ${}", PRINT_FORMAT));
        self.emit("  call printf");
        self.emit("  addl $8, %esp");
        self.epilogue();
    }

    /// `Start(heap)` sets up the bump allocator, reserves the Program object at
    /// the heap base and runs `Program.start` on it.
    fn gen_start(&mut self, program_size: i32) {
        let start = method_label("Program", "start");
        self.emit(&format!("  .globl {}", START_FUN));
        self.emit(&format!("  .type {}, @function", START_FUN));
        self.emit(&format!("{}:", START_FUN));
        self.emit("  pushl %ebp");
        self.emit("  movl %esp, %ebp");
        self.emit("  movl 8(%ebp), %ecx");
        self.emit(&format!("  movl %ecx, {}", HEAP_BASE));
        self.emit(&format!("  movl %ecx, {}", HEAP_TOP));
        self.emit(&format!("  addl ${}, {}", program_size, HEAP_TOP));
        self.emit(&format!("  pushl {}", HEAP_BASE));
        self.emit(&format!("  call {}", start));
        self.emit(&format!("  addl ${}, %esp", WORD_SIZE));
        self.epilogue();
    }

    fn gen_class(&mut self, classes: &[ClassDef], class: &ClassDef) {
        self.emit(&format!("# class {}", class.name));
        self.current_class = class.name.clone();
        self.class_layout = self.offsets.layout_class(classes, &class.name).clone();

        for method in &class.methods {
            self.gen_method(method);
        }
    }

    fn gen_method(&mut self, method: &MethodDef) {
        let frame = self
            .offsets
            .layout_frame(&self.current_class, method)
            .clone();
        let label = method_label(&self.current_class, &method.name);
        debug!(method = %label, params = frame.params.len(), locals = frame.locals.len(), "generating method");

        self.emit(&format!("{}:", label));
        self.emit("  pushl %ebp");
        self.emit("  movl %esp, %ebp");
        self.emit(&format!("  subl ${}, %esp", frame.locals_size()));
        self.frame = Some(frame);

        for stmt in &method.body.stmts {
            self.gen_stmt(stmt);
        }

        self.gen_expr(&method.body.ret);
        self.emit("  popl %eax");
        self.epilogue();
        self.frame = None;
    }

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Assign(name, expr) => {
                self.gen_expr(expr);
                self.gen_store(name);
            }
            StmtKind::If(pred, body) => self.gen_if(pred, body),
            StmtKind::Print(expr) => {
                self.gen_expr(expr);
                self.emit(&format!("  call {}", PRINT_FUN));
                self.emit(&format!("  addl ${}, %esp", WORD_SIZE));
            }
        }
    }

    fn gen_if(&mut self, pred: &Expr, body: &[Stmt]) {
        let end_label = self.new_label();
        self.gen_expr(pred);
        self.emit("  popl %eax");
        self.emit("  cmpl $1, %eax");
        self.emit(&format!("  jne {end_label}"));
        for s in body {
            self.gen_stmt(s);
        }
        self.emit(&format!("{end_label}:"));
    }

    /// Locals and parameters shadow fields, matching name resolution in the
    /// type checker.
    fn locate(&self, name: &str) -> Location {
        if let Some(slot) = self.frame().get(name) {
            return Location::Frame(slot.clone());
        }
        match self.class_layout.field(name) {
            Some(slot) => Location::Field(slot.clone()),
            None => panic!("unresolved variable {} reached code generation", name),
        }
    }

    fn load_receiver(&mut self, reg: &str) {
        let receiver = self.frame().receiver_offset;
        self.emit(&format!("  movl {}(%ebp), {}", receiver, reg));
    }

    fn gen_load(&mut self, name: &str) {
        match self.locate(name) {
            Location::Frame(slot) => self.emit(&format!("  pushl {}(%ebp)", slot.offset)),
            Location::Field(slot) => {
                self.load_receiver("%ecx");
                if slot.ty.class_name().is_some() {
                    // embedded object: its value is its address
                    self.emit(&format!("  leal {}(%ecx), %eax", slot.offset));
                    self.emit("  pushl %eax");
                } else {
                    self.emit(&format!("  pushl {}(%ecx)", slot.offset));
                }
            }
        }
    }

    fn gen_store(&mut self, name: &str) {
        self.emit("  popl %eax");
        match self.locate(name) {
            Location::Frame(slot) => self.emit(&format!("  movl %eax, {}(%ebp)", slot.offset)),
            Location::Field(slot) => {
                self.load_receiver("%ecx");
                if slot.ty.class_name().is_some() {
                    for word in (0..slot.size).step_by(WORD_SIZE as usize) {
                        self.emit(&format!("  movl {}(%eax), %edx", word));
                        self.emit(&format!("  movl %edx, {}(%ecx)", slot.offset + word));
                    }
                } else {
                    self.emit(&format!("  movl %eax, {}(%ecx)", slot.offset));
                }
            }
        }
    }

    fn gen_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Binary(kind, left, right) => {
                self.gen_expr(left);
                self.gen_expr(right);
                self.gen_bin_op_kind(kind);
            }
            ExprKind::Unary(UnaryOpKind::Neg, operand) => {
                self.gen_expr(operand);
                self.gen_oneop("  negl %eax");
            }
            ExprKind::Unary(UnaryOpKind::Not, operand) => {
                self.gen_expr(operand);
                self.gen_oneop("  xorl $1, %eax");
            }
            ExprKind::MethodCall(receiver, method, args) => {
                let class = receiver
                    .ty()
                    .and_then(|ty| ty.class_name())
                    .expect("receiver was not resolved to an object type")
                    .to_string();
                self.gen_expr(receiver);
                self.gen_call(&class, expr, method, args);
            }
            ExprKind::SelfCall(method, args) => {
                let receiver = self.frame().receiver_offset;
                self.emit(&format!("  pushl {}(%ebp)", receiver));
                let class = self.current_class.clone();
                self.gen_call(&class, expr, method, args);
            }
            ExprKind::Variable(name) => self.gen_load(name),
            ExprKind::Num(num) => self.emit(&format!("  pushl ${}", num)),
            ExprKind::Bool(b) => self.emit(&format!("  pushl ${}", i32::from(*b))),
            ExprKind::Nothing => self.emit("  pushl $0"),
            ExprKind::New(class) => self.gen_new(class),
        }
    }

    fn gen_bin_op_kind(&mut self, kind: &BinOpKind) {
        match kind {
            BinOpKind::Add => self._gen_binop("  addl %ebx, %eax"),
            BinOpKind::Sub => self._gen_binop("  subl %ebx, %eax"),
            BinOpKind::Mul => self._gen_binop("  imull %ebx, %eax"),
            BinOpKind::Div => self._gen_binop("  cdq\n  idivl %ebx"),
            BinOpKind::And => self._gen_binop("  andl %ebx, %eax"),

            BinOpKind::LessThan => self.gen_compare("jl"),
            BinOpKind::LessEqual => self.gen_compare("jle"),
            BinOpKind::Equal => self.gen_compare("je"),
            BinOpKind::NotEqual => self.gen_compare("jne"),
        }
    }

    /// Pushes 1 when `left <jump> right` holds and 0 otherwise.
    fn gen_compare(&mut self, jump: &str) {
        let true_label = self.new_label();
        let end_label = self.new_label();

        self.emit("  popl %ebx");
        self.emit("  popl %eax");
        self.emit("  cmpl %ebx, %eax");
        self.emit(&format!("  {jump} {true_label}"));
        self.emit("  pushl $0");
        self.emit(&format!("  jmp {end_label}"));
        self.emit(&format!("{true_label}:"));
        self.emit("  pushl $1");
        self.emit(&format!("{end_label}:"));
    }

    /// Expects the receiver already pushed. Arguments go on in reverse so the
    /// first one ends up nearest the return address. Dispatch is static: the
    /// callee is the class the type checker resolved `method` to from the
    /// receiver's static class `class`.
    fn gen_call(&mut self, class: &str, call: &Expr, method: &str, args: &[Expr]) {
        for arg in args.iter().rev() {
            self.gen_expr(arg);
        }

        let defining_class = call
            .callee()
            .unwrap_or_else(|| panic!("unresolved method {}.{} reached code generation", class, method));
        debug_assert!(self.tables.class_table.is_subclass(class, defining_class));
        let label = method_label(defining_class, method);

        self.emit(&format!("  call {}", label));
        let pushed = (args.len() as i32 + 1) * WORD_SIZE;
        self.emit(&format!("  addl ${}, %esp", pushed));
        self.emit("  pushl %eax");
    }

    /// Bump-allocates a zeroed instance of `class` and pushes its address.
    fn gen_new(&mut self, class: &str) {
        let size = self
            .offsets
            .class_layout(class)
            .unwrap_or_else(|| panic!("layout of {} is computed before it is instantiated", class))
            .size;

        self.emit(&format!("  movl {}, %eax", HEAP_TOP));
        self.emit(&format!("  addl ${}, {}", size, HEAP_TOP));
        for word in (0..size).step_by(WORD_SIZE as usize) {
            self.emit(&format!("  movl $0, {}(%eax)", word));
        }
        self.emit("  pushl %eax");
    }
}
