#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::HashMap;

use classcc::{analyze, compile, parser::Program, analyzer::SemanticTables};

const HEAP_START: i32 = 0x0001_0000;
const STACK_START: i32 = 0x0010_0000;
const DATA_START: i32 = 0x0000_1000;
const RETURN_SENTINEL: i32 = -1;
const MAX_STEPS: usize = 1_000_000;

pub fn wrap_in_start(body: &str) -> String {
    format!("class Program {{ nothing start() {{ {} return nothing; }} }}", body)
}

pub fn analyze_ok(input: &str) -> (Program, SemanticTables) {
    match analyze(input) {
        Ok(analyzed) => analyzed,
        Err(e) => panic!("expected a well typed program, got: {}", e),
    }
}

pub fn compile_ok(input: &str) -> String {
    match compile(input) {
        Ok(asm) => asm,
        Err(e) => panic!("expected a well typed program, got: {}", e),
    }
}

/// Compiles `input` and runs the result, returning what it printed.
pub fn run_program(input: &str) -> String {
    Machine::load(&compile_ok(input)).run()
}

#[derive(Clone, Debug)]
enum Operand {
    Imm(i32),
    Reg(String),
    Mem(String, i32),
    Abs(i32),
    Label(String),
}

#[derive(Clone, Debug)]
struct Instr {
    op: String,
    args: Vec<String>,
}

/// Interpreter for the i386 subset the code generator emits. `printf` is
/// stubbed to append the formatted integer to the captured output.
pub struct Machine {
    code: Vec<Instr>,
    labels: HashMap<String, usize>,
    symbols: HashMap<String, i32>,
    regs: HashMap<String, i32>,
    mem: HashMap<i32, i32>,
    flags: Ordering,
    output: String,
}

impl Machine {
    pub fn load(asm: &str) -> Self {
        let mut code = vec![];
        let mut labels = HashMap::new();
        let mut symbols = HashMap::new();

        for line in asm.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(label) = line.strip_suffix(':') {
                labels.insert(label.to_string(), code.len());
                continue;
            }
            if let Some(rest) = line.strip_prefix(".comm ") {
                let name = rest.split(',').next().unwrap().trim().to_string();
                let addr = DATA_START + 4 * symbols.len() as i32;
                symbols.insert(name, addr);
                continue;
            }
            if line.starts_with('.') {
                continue;
            }

            let (op, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let args = rest
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            code.push(Instr {
                op: op.to_string(),
                args,
            });
        }

        let regs = ["eax", "ebx", "ecx", "edx", "esp", "ebp"]
            .iter()
            .map(|r| (r.to_string(), 0))
            .collect();

        Self {
            code,
            labels,
            symbols,
            regs,
            mem: HashMap::new(),
            flags: Ordering::Equal,
            output: String::new(),
        }
    }

    pub fn load_word(&self, addr: i32) -> i32 {
        assert_eq!(addr % 4, 0, "unaligned access at {:#x}", addr);
        *self.mem.get(&addr).unwrap_or(&0)
    }

    pub fn heap_top(&self) -> i32 {
        self.load_word(self.symbols["heap_top"])
    }

    fn store_word(&mut self, addr: i32, value: i32) {
        assert_eq!(addr % 4, 0, "unaligned access at {:#x}", addr);
        self.mem.insert(addr, value);
    }

    fn reg(&self, name: &str) -> i32 {
        self.regs[name]
    }

    fn set_reg(&mut self, name: &str, value: i32) {
        self.regs.insert(name.to_string(), value);
    }

    fn push(&mut self, value: i32) {
        let esp = self.reg("esp") - 4;
        self.set_reg("esp", esp);
        self.store_word(esp, value);
    }

    fn pop(&mut self) -> i32 {
        let esp = self.reg("esp");
        let value = self.load_word(esp);
        self.set_reg("esp", esp + 4);
        value
    }

    fn operand(&self, s: &str) -> Operand {
        if let Some(imm) = s.strip_prefix('$') {
            return match imm.parse() {
                Ok(n) => Operand::Imm(n),
                Err(_) => Operand::Imm(*self.symbols.get(imm).unwrap_or(&0)),
            };
        }
        if let Some(reg) = s.strip_prefix('%') {
            return Operand::Reg(reg.to_string());
        }
        if let Some((offset, reg)) = s.split_once("(%") {
            let reg = reg.trim_end_matches(')').to_string();
            let offset = if offset.is_empty() {
                0
            } else {
                offset.parse().unwrap()
            };
            return Operand::Mem(reg, offset);
        }
        match self.symbols.get(s) {
            Some(&addr) => Operand::Abs(addr),
            None => Operand::Label(s.to_string()),
        }
    }

    fn read(&self, s: &str) -> i32 {
        match self.operand(s) {
            Operand::Imm(n) => n,
            Operand::Reg(r) => self.reg(&r),
            Operand::Mem(r, off) => self.load_word(self.reg(&r) + off),
            Operand::Abs(addr) => self.load_word(addr),
            Operand::Label(l) => panic!("cannot read label {}", l),
        }
    }

    fn write(&mut self, s: &str, value: i32) {
        match self.operand(s) {
            Operand::Reg(r) => self.set_reg(&r, value),
            Operand::Mem(r, off) => {
                let addr = self.reg(&r) + off;
                self.store_word(addr, value);
            }
            Operand::Abs(addr) => self.store_word(addr, value),
            o => panic!("cannot write to {:?}", o),
        }
    }

    fn address(&self, s: &str) -> i32 {
        match self.operand(s) {
            Operand::Mem(r, off) => self.reg(&r) + off,
            o => panic!("cannot take the address of {:?}", o),
        }
    }

    fn jump(&self, label: &str) -> usize {
        *self
            .labels
            .get(label)
            .unwrap_or_else(|| panic!("undefined label {}", label))
    }

    /// Calls `Start(heap)` and runs until it returns.
    pub fn run(mut self) -> String {
        self.set_reg("esp", STACK_START);
        self.push(HEAP_START);
        self.push(RETURN_SENTINEL);
        let mut pc = self.jump("Start");

        for _ in 0..MAX_STEPS {
            let Instr { op, args } = self.code[pc].clone();
            pc += 1;

            let binop = |m: &mut Self, f: fn(i32, i32) -> i32| {
                let value = f(m.read(&args[1]), m.read(&args[0]));
                m.write(&args[1], value);
            };

            match op.as_str() {
                "pushl" => {
                    let value = self.read(&args[0]);
                    self.push(value);
                }
                "popl" => {
                    let value = self.pop();
                    self.write(&args[0], value);
                }
                "movl" => {
                    let value = self.read(&args[0]);
                    self.write(&args[1], value);
                }
                "leal" => {
                    let addr = self.address(&args[0]);
                    self.write(&args[1], addr);
                }
                "addl" => binop(&mut self, i32::wrapping_add),
                "subl" => binop(&mut self, i32::wrapping_sub),
                "imull" => binop(&mut self, i32::wrapping_mul),
                "andl" => binop(&mut self, |a, b| a & b),
                "xorl" => binop(&mut self, |a, b| a ^ b),
                "negl" => {
                    let value = self.read(&args[0]).wrapping_neg();
                    self.write(&args[0], value);
                }
                "cdq" => {
                    let sign = if self.reg("eax") < 0 { -1 } else { 0 };
                    self.set_reg("edx", sign);
                }
                "idivl" => {
                    let divisor = self.read(&args[0]);
                    let eax = self.reg("eax");
                    self.set_reg("eax", eax / divisor);
                    self.set_reg("edx", eax % divisor);
                }
                "cmpl" => {
                    let right = self.read(&args[0]);
                    let left = self.read(&args[1]);
                    self.flags = left.cmp(&right);
                }
                "jmp" => pc = self.jump(&args[0]),
                "jl" | "jle" | "je" | "jne" => {
                    let taken = match op.as_str() {
                        "jl" => self.flags == Ordering::Less,
                        "jle" => self.flags != Ordering::Greater,
                        "je" => self.flags == Ordering::Equal,
                        _ => self.flags != Ordering::Equal,
                    };
                    if taken {
                        pc = self.jump(&args[0]);
                    }
                }
                "call" if args[0] == "printf" => {
                    let esp = self.reg("esp");
                    let value = self.load_word(esp + 4);
                    self.output.push_str(&format!("{}\n", value));
                }
                "call" => {
                    self.push(pc as i32);
                    pc = self.jump(&args[0]);
                }
                "leave" => {
                    let ebp = self.reg("ebp");
                    self.set_reg("esp", ebp);
                    let saved = self.pop();
                    self.set_reg("ebp", saved);
                }
                "ret" => {
                    let target = self.pop();
                    if target == RETURN_SENTINEL {
                        assert_eq!(self.reg("esp"), STACK_START - 4, "unbalanced stack");
                        return self.output;
                    }
                    pc = target as usize;
                }
                _ => panic!("unsupported instruction {}", op),
            }
        }

        panic!("program did not terminate");
    }
}
