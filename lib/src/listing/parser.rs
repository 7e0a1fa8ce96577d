use super::Listing;
use crate::jvm::code::opcodes::*;
use crate::jvm::code::{
    base_type_from_keyword, Code, Constant, CountingLabelGenerator, ExceptionRange, Instruction,
    Label, LabelGenerator, MethodHandle,
};
use crate::jvm::model::{Class, Method};
use crate::jvm::{
    BinaryName, ClassAccessFlags, Error, FieldType, MethodAccessFlags, MethodDescriptor, Name,
    ParseDescriptor, RefType, UnqualifiedName,
};
use std::collections::HashMap;

/// Parse a listing
///
/// Errors carry the (1-based) line on which they were detected.
pub fn parse(source: &str) -> Result<Listing, Error> {
    let mut parser = Parser::default();
    for (idx, line) in source.lines().enumerate() {
        parser.line = idx + 1;
        let line = strip_comment(line).trim();
        if !line.is_empty() {
            parser.parse_line(line)?;
        }
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    /// Current line number
    line: usize,
    classes: Vec<Class>,
    class: Option<Class>,
    method: Option<MethodBuilder>,
}

/// Method whose body is still being parsed
struct MethodBuilder {
    method: Method,
    instructions: Vec<Instruction>,
    exception_ranges: Vec<ExceptionRange>,
    label_generator: CountingLabelGenerator,

    /// Labels by name, along with the line on which they were first mentioned
    labels: HashMap<String, (Label, usize)>,
    placed: HashMap<Label, usize>,

    max_stack: u16,
    max_locals: u16,
}

impl Parser {
    fn fail<T>(&self, message: impl Into<String>) -> Result<T, Error> {
        Err(Error::MalformedListing {
            line: self.line,
            message: message.into(),
        })
    }

    fn parse_line(&mut self, line: &str) -> Result<(), Error> {
        let (first, rest) = split_word(line);

        match first {
            ".class" => self.start_class(rest),
            ".super" | ".implements" => {
                let name = self.binary_name(rest.trim())?;
                let class = match &mut self.class {
                    Some(class) if self.method.is_none() => class,
                    _ => return self.fail(format!("`{}` outside of a class header", first)),
                };
                if first == ".super" {
                    class.superclass = Some(name);
                } else {
                    class.interfaces.push(name);
                }
                Ok(())
            }
            ".method" => self.start_method(rest),
            ".end" => self.end_method(rest),
            ".catch" => self.catch(rest),
            ".limit" => self.limit(rest),
            directive if directive.starts_with('.') => {
                self.fail(format!("unknown directive `{}`", directive))
            }
            label if rest.is_empty() && label.ends_with(':') => {
                self.place_label(&label[..label.len() - 1])
            }
            mnemonic => {
                let insn = self.instruction(mnemonic, rest.trim())?;
                match &mut self.method {
                    Some(method) => {
                        method.instructions.push(insn);
                        Ok(())
                    }
                    None => self.fail("instruction outside of a method"),
                }
            }
        }
    }

    fn finish(mut self) -> Result<Listing, Error> {
        if self.method.is_some() {
            return self.fail("missing `.end method`");
        }
        if let Some(class) = self.class.take() {
            self.classes.push(class);
        }
        Ok(Listing {
            classes: self.classes,
        })
    }

    fn start_class(&mut self, rest: &str) -> Result<(), Error> {
        if self.method.is_some() {
            return self.fail("missing `.end method` before `.class`");
        }
        let mut words: Vec<&str> = rest.split_whitespace().collect();
        let name = match words.pop() {
            Some(name) => self.binary_name(name)?,
            None => return self.fail("missing class name"),
        };
        let mut access_flags = ClassAccessFlags::empty();
        for word in words {
            match ClassAccessFlags::from_keyword(word) {
                Some(flag) => access_flags |= flag,
                None => return self.fail(format!("unknown class flag `{}`", word)),
            }
        }

        let mut class = Class::new(name, access_flags);
        if class.name == BinaryName::OBJECT {
            class.superclass = None;
        }
        if let Some(previous) = self.class.replace(class) {
            self.classes.push(previous);
        }
        Ok(())
    }

    fn start_method(&mut self, rest: &str) -> Result<(), Error> {
        if self.class.is_none() {
            return self.fail("`.method` outside of a class");
        }
        if self.method.is_some() {
            return self.fail("missing `.end method` before `.method`");
        }

        let mut words: Vec<&str> = rest.split_whitespace().collect();
        let signature = match words.pop() {
            Some(signature) => signature,
            None => return self.fail("missing method name and descriptor"),
        };
        let mut access_flags = MethodAccessFlags::empty();
        for word in words {
            match MethodAccessFlags::from_keyword(word) {
                Some(flag) => access_flags |= flag,
                None => return self.fail(format!("unknown method flag `{}`", word)),
            }
        }

        let (name, descriptor) = match signature.find('(') {
            Some(paren) => signature.split_at(paren),
            None => return self.fail(format!("missing descriptor in `{}`", signature)),
        };
        let name = self.unqualified_name(name)?;
        let descriptor = self.descriptor::<MethodDescriptor<BinaryName>>(descriptor)?;

        self.method = Some(MethodBuilder {
            method: Method::new(name, descriptor, access_flags),
            instructions: vec![],
            exception_ranges: vec![],
            label_generator: CountingLabelGenerator::default(),
            labels: HashMap::new(),
            placed: HashMap::new(),
            max_stack: 0,
            max_locals: 0,
        });
        Ok(())
    }

    fn end_method(&mut self, rest: &str) -> Result<(), Error> {
        if rest.trim() != "method" {
            return self.fail("expected `.end method`");
        }
        let builder = match self.method.take() {
            Some(builder) => builder,
            None => return self.fail("`.end method` outside of a method"),
        };

        let mut unplaced: Vec<(&String, &(Label, usize))> = builder
            .labels
            .iter()
            .filter(|(_, (label, _))| !builder.placed.contains_key(label))
            .collect();
        unplaced.sort_by_key(|(_, (_, line))| *line);
        if let Some((name, (_, line))) = unplaced.first() {
            return Err(Error::MalformedListing {
                line: *line,
                message: format!("label `{}` is never placed", name),
            });
        }

        let mut method = builder.method;
        let has_body = !method
            .access_flags
            .intersects(MethodAccessFlags::ABSTRACT | MethodAccessFlags::NATIVE);
        if has_body {
            let mut code = Code::new(
                builder.instructions,
                builder.exception_ranges,
                builder.label_generator,
            );
            code.max_stack = builder.max_stack;
            code.max_locals = builder.max_locals;
            method.code_impl = Some(code);
        } else if !builder.instructions.is_empty() {
            return self.fail(format!("method `{}` cannot have a body", method.name));
        }

        match &mut self.class {
            Some(class) => class.methods.push(method),
            None => return self.fail("`.end method` outside of a class"),
        }
        Ok(())
    }

    fn catch(&mut self, rest: &str) -> Result<(), Error> {
        let words: Vec<&str> = rest.split_whitespace().collect();
        let (catch_type, start, end, handler) = match words.as_slice() {
            [catch_type, "from", start, "to", end, "using", handler] => {
                (*catch_type, *start, *end, *handler)
            }
            _ => return self.fail("expected `.catch <class|any> from <label> to <label> using <label>`"),
        };
        let catch_type = match catch_type {
            "any" => None,
            name => Some(self.binary_name(name)?),
        };
        let range = ExceptionRange {
            start: self.label_ref(start)?,
            end: self.label_ref(end)?,
            handler: self.label_ref(handler)?,
            catch_type,
        };
        match &mut self.method {
            Some(method) => {
                method.exception_ranges.push(range);
                Ok(())
            }
            None => self.fail("`.catch` outside of a method"),
        }
    }

    fn limit(&mut self, rest: &str) -> Result<(), Error> {
        let words: Vec<&str> = rest.split_whitespace().collect();
        let (which, value) = match words.as_slice() {
            [which, value] => (*which, self.number::<u16>(value)?),
            _ => return self.fail("expected `.limit stack|locals <n>`"),
        };
        let method = match &mut self.method {
            Some(method) => method,
            None => return self.fail("`.limit` outside of a method"),
        };
        match which {
            "stack" => method.max_stack = value,
            "locals" => method.max_locals = value,
            _ => return self.fail(format!("unknown limit `{}`", which)),
        }
        Ok(())
    }

    fn place_label(&mut self, name: &str) -> Result<(), Error> {
        let label = self.label_ref(name)?;
        let line = self.line;
        let method = match &mut self.method {
            Some(method) => method,
            None => return self.fail("label outside of a method"),
        };
        if let Some(previous) = method.placed.insert(label, line) {
            return self.fail(format!(
                "label `{}` is already placed on line {}",
                name, previous
            ));
        }
        method.instructions.push(Instruction::Label(label));
        Ok(())
    }

    /// Find the label with the given name, making a new one on first mention
    fn label_ref(&mut self, name: &str) -> Result<Label, Error> {
        if name.is_empty() || name.contains(':') {
            return self.fail(format!("invalid label name `{}`", name));
        }
        let line = self.line;
        let method = match &mut self.method {
            Some(method) => method,
            None => return self.fail("label outside of a method"),
        };
        if let Some((label, _)) = method.labels.get(name) {
            return Ok(*label);
        }
        let label = method.label_generator.fresh_label();
        method.labels.insert(name.to_owned(), (label, line));
        Ok(label)
    }

    fn instruction(&mut self, mnemonic: &str, rest: &str) -> Result<Instruction, Error> {
        let opcode = match from_mnemonic(mnemonic) {
            Some(opcode) => opcode,
            None => return self.fail(format!("unknown instruction `{}`", mnemonic)),
        };
        let operands: Vec<&str> = rest.split_whitespace().collect();

        let insn = match opcode {
            BIPUSH | SIPUSH => {
                let [value] = self.operands::<1>(mnemonic, &operands)?;
                let value: i32 = self.number(value)?;
                let in_range = if opcode == BIPUSH {
                    i8::try_from(value).is_ok()
                } else {
                    i16::try_from(value).is_ok()
                };
                if !in_range {
                    return self.fail(format!("`{}` operand {} is out of range", mnemonic, value));
                }
                Instruction::Push(Constant::Integer(value))
            }
            LDC | LDC_W | LDC2_W => {
                let constant = self.constant(rest)?;
                if constant.is_wide() != (opcode == LDC2_W) {
                    return self.fail(format!("`{}` cannot load {}", mnemonic, constant));
                }
                Instruction::Push(constant)
            }
            ILOAD..=ALOAD | ISTORE..=ASTORE | RET => {
                let [index] = self.operands::<1>(mnemonic, &operands)?;
                Instruction::Var {
                    opcode,
                    index: self.number(index)?,
                }
            }
            IINC => {
                let [index, value] = self.operands::<2>(mnemonic, &operands)?;
                Instruction::IInc {
                    index: self.number(index)?,
                    value: self.number(value)?,
                }
            }
            IFEQ..=JSR | IFNULL | IFNONNULL | GOTO_W | JSR_W => {
                let [target] = self.operands::<1>(mnemonic, &operands)?;
                Instruction::Branch {
                    opcode,
                    target: self.label_ref(target)?,
                }
            }
            TABLESWITCH => {
                let (low, rest) = match operands.split_first() {
                    Some((low, rest)) => (self.number::<i32>(low)?, rest),
                    None => return self.fail("`tableswitch` needs a low index"),
                };
                let (default, targets) = self.switch_default(rest)?;
                let targets = targets
                    .iter()
                    .map(|target| self.label_ref(target))
                    .collect::<Result<Vec<_>, _>>()?;
                Instruction::TableSwitch {
                    default,
                    low,
                    targets,
                }
            }
            LOOKUPSWITCH => {
                let (default, entries) = self.switch_default(&operands)?;
                let mut targets = vec![];
                for entry in entries {
                    let (key, target) = match entry.split_once(':') {
                        Some(entry) => entry,
                        None => return self.fail(format!("expected `key:label`, got `{}`", entry)),
                    };
                    targets.push((self.number::<i32>(key)?, self.label_ref(target)?));
                }
                Instruction::LookupSwitch { default, targets }
            }
            GETSTATIC..=PUTFIELD => {
                let [owner, name, descriptor] = self.operands::<3>(mnemonic, &operands)?;
                Instruction::Field {
                    opcode,
                    owner: self.binary_name(owner)?,
                    name: self.unqualified_name(name)?,
                    descriptor: self.descriptor(descriptor)?,
                }
            }
            INVOKEVIRTUAL..=INVOKEINTERFACE => {
                let (owner, name, descriptor, interface) = match operands.as_slice() {
                    [owner, name, descriptor] => (owner, name, descriptor, false),
                    [owner, name, descriptor, "interface"] => (owner, name, descriptor, true),
                    _ => return self.fail(format!("`{}` expects an owner, name, and descriptor", mnemonic)),
                };
                Instruction::Method {
                    opcode,
                    owner: self.binary_name(owner)?,
                    name: self.unqualified_name(name)?,
                    descriptor: self.descriptor(descriptor)?,
                    interface: interface || opcode == INVOKEINTERFACE,
                }
            }
            INVOKEDYNAMIC => self.invoke_dynamic(rest)?,
            NEW | CHECKCAST | INSTANCEOF => {
                let [class] = self.operands::<1>(mnemonic, &operands)?;
                Instruction::Type {
                    opcode,
                    class: self.class_operand(class)?,
                }
            }
            NEWARRAY => {
                let [keyword] = self.operands::<1>(mnemonic, &operands)?;
                match base_type_from_keyword(keyword) {
                    Some(base_type) => Instruction::NewArray(FieldType::Base(base_type)),
                    None => return self.fail(format!("unknown primitive type `{}`", keyword)),
                }
            }
            ANEWARRAY => {
                let [class] = self.operands::<1>(mnemonic, &operands)?;
                Instruction::NewArray(FieldType::Ref(self.class_operand(class)?))
            }
            MULTIANEWARRAY => {
                let [class, dimensions] = self.operands::<2>(mnemonic, &operands)?;
                Instruction::MultiANewArray {
                    class: self.class_operand(class)?,
                    dimensions: self.number(dimensions)?,
                }
            }
            WIDE => return self.fail("`wide` is implied by the operands of the next instruction"),
            _ => {
                self.operands::<0>(mnemonic, &operands)?;
                Instruction::Simple(opcode)
            }
        };
        Ok(insn)
    }

    /// Split off the `default:<label>` operand of a switch
    fn switch_default<'a, 'b>(
        &mut self,
        operands: &'b [&'a str],
    ) -> Result<(Label, &'b [&'a str]), Error> {
        match operands.split_last() {
            Some((last, rest)) if last.starts_with("default:") => {
                let default = self.label_ref(&last["default:".len()..])?;
                Ok((default, rest))
            }
            _ => self.fail("switch needs a `default:<label>` operand last"),
        }
    }

    /// `invokedynamic <name> <descriptor> <bootstrap handle> [, <argument>]*`
    fn invoke_dynamic(&mut self, rest: &str) -> Result<Instruction, Error> {
        let mut parts = rest.split(" , ");
        let head: Vec<&str> = parts.next().unwrap_or("").split_whitespace().collect();
        let (name, descriptor, bootstrap) = match head.as_slice() {
            [name, descriptor, bootstrap @ ..] if !bootstrap.is_empty() => {
                (*name, *descriptor, bootstrap.join(" "))
            }
            _ => return self.fail("`invokedynamic` expects a name, descriptor, and bootstrap handle"),
        };
        let arguments = parts
            .map(|argument| self.constant(argument))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Instruction::InvokeDynamic {
            name: self.unqualified_name(name)?,
            descriptor: self.descriptor(descriptor)?,
            bootstrap: self.method_handle(&bootstrap)?,
            arguments,
        })
    }

    /// Loadable constant, as written after `ldc`
    fn constant(&self, text: &str) -> Result<Constant, Error> {
        let text = text.trim();
        if text.starts_with('"') {
            return match unescape_string(text) {
                Some(string) => Ok(Constant::String(string)),
                None => self.fail(format!("malformed string literal {}", text)),
            };
        }

        let (keyword, rest) = split_word(text);
        let rest = rest.trim();
        let constant = match keyword {
            "class" => Constant::Class(self.class_operand(rest)?),
            "methodtype" => Constant::MethodType(self.descriptor(rest)?),
            "handle" => Constant::MethodHandle(self.method_handle(rest)?),
            "dynamic" => {
                let (name, descriptor) = split_word(rest);
                Constant::Dynamic {
                    name: self.unqualified_name(name)?,
                    descriptor: self.descriptor(descriptor.trim())?,
                }
            }
            _ => self.numeric_constant(text)?,
        };
        Ok(constant)
    }

    /// Numeric constant: `L` suffix for `long`, `f` for `float`, `d` for `double`
    fn numeric_constant(&self, text: &str) -> Result<Constant, Error> {
        let parsed = if let Some(value) = text.strip_suffix('L') {
            value.parse().ok().map(Constant::Long)
        } else if let Some(value) = text.strip_suffix('f') {
            value.parse().ok().map(Constant::Float)
        } else if let Some(value) = text.strip_suffix('d') {
            value.parse().ok().map(Constant::Double)
        } else {
            text.parse().ok().map(Constant::Integer)
        };
        match parsed {
            Some(constant) => Ok(constant),
            None => self.fail(format!("malformed constant `{}`", text)),
        }
    }

    /// `<kind> <owner> <name> <descriptor> [interface]`
    fn method_handle(&self, text: &str) -> Result<MethodHandle, Error> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let (kind, owner, name, descriptor, interface) = match words.as_slice() {
            [kind, owner, name, descriptor] => (kind, owner, name, descriptor, false),
            [kind, owner, name, descriptor, "interface"] => (kind, owner, name, descriptor, true),
            _ => return self.fail("method handles are `<kind> <owner> <name> <descriptor>`"),
        };
        let kind: u8 = self.number(kind)?;
        if !(1..=9).contains(&kind) {
            return self.fail(format!("invalid method handle kind {}", kind));
        }
        Ok(MethodHandle {
            kind,
            owner: self.binary_name(owner)?,
            name: self.unqualified_name(name)?,
            descriptor: descriptor.to_string(),
            interface,
        })
    }

    /// Class as referenced by `new`, `checkcast`, and friends: a name or an array descriptor
    fn class_operand(&self, text: &str) -> Result<RefType<BinaryName>, Error> {
        if text.starts_with('[') {
            self.descriptor(text)
        } else {
            Ok(RefType::Object(self.binary_name(text)?))
        }
    }

    fn operands<'a, const N: usize>(
        &self,
        mnemonic: &str,
        operands: &[&'a str],
    ) -> Result<[&'a str; N], Error> {
        match <[&str; N]>::try_from(operands) {
            Ok(operands) => Ok(operands),
            Err(_) => self.fail(format!(
                "`{}` expects {} operand(s), got {}",
                mnemonic,
                N,
                operands.len()
            )),
        }
    }

    fn number<N: std::str::FromStr>(&self, text: &str) -> Result<N, Error> {
        match text.parse() {
            Ok(number) => Ok(number),
            Err(_) => self.fail(format!("malformed number `{}`", text)),
        }
    }

    fn binary_name(&self, text: &str) -> Result<BinaryName, Error> {
        BinaryName::from_string(text.to_owned()).or_else(|message| self.fail(message))
    }

    fn unqualified_name(&self, text: &str) -> Result<UnqualifiedName, Error> {
        UnqualifiedName::from_string(text.to_owned()).or_else(|message| self.fail(message))
    }

    fn descriptor<D: ParseDescriptor>(&self, text: &str) -> Result<D, Error> {
        D::parse(text).or_else(|err| self.fail(format!("bad descriptor `{}`: {}", text, err)))
    }
}

/// Split off the first whitespace-delimited word
fn split_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(idx) => text.split_at(idx),
        None => (text, ""),
    }
}

/// Remove a trailing `#` comment (ignoring `#` inside string literals)
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..idx],
            _ => (),
        }
    }
    line
}

/// Decode a double-quoted string literal with Rust-style escapes
fn unescape_string(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut string = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            return None;
        }
        if c != '\\' {
            string.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'u' => {
                let rest = chars.as_str().strip_prefix('{')?;
                let close = rest.find('}')?;
                let code = u32::from_str_radix(&rest[..close], 16).ok()?;
                chars = rest[close + 1..].chars();
                char::from_u32(code)?
            }
            _ => return None,
        };
        string.push(escaped);
    }
    Some(string)
}

#[cfg(test)]
mod test {
    use super::*;

    fn body(source: &str) -> Code {
        let listing = parse(&format!(
            ".class Test\n.method static test()V\n{}\n.end method\n",
            source
        ))
        .unwrap();
        listing.classes[0].methods[0].code_impl.clone().unwrap()
    }

    fn error_line(source: &str) -> usize {
        match parse(source) {
            Err(Error::MalformedListing { line, .. }) => line,
            other => panic!("expected a listing error, got {:?}", other),
        }
    }

    #[test]
    fn classes_and_methods() {
        let listing = parse(
            "# A class
            .class public final me/alec/Foo
            .super me/alec/Bar
            .implements java/lang/Runnable

            .method public abstract run()V
            .end method

            .method public static <clinit>()V   # trailing comment
                return
            .end method

            .class java/lang/Object
            ",
        )
        .unwrap();

        assert_eq!(listing.classes.len(), 2);
        let foo = &listing.classes[0];
        assert_eq!(foo.name.as_str(), "me/alec/Foo");
        assert_eq!(foo.access_flags, ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL);
        assert_eq!(foo.superclass.as_ref().map(|name| name.as_str()), Some("me/alec/Bar"));
        assert_eq!(foo.interfaces.len(), 1);
        assert_eq!(foo.methods.len(), 2);
        assert!(foo.methods[0].code_impl.is_none());
        assert_eq!(foo.methods[1].name, UnqualifiedName::CLINIT);
        assert!(foo.methods[1].is_static());
        assert_eq!(listing.classes[1].superclass, None);
    }

    #[test]
    fn operands() {
        let code = body(
            "bipush -3
            ldc 1.5f
            ldc2_w 7L
            ldc \"a # b\\n\"
            ldc class [I
            iload 4
            iinc 2 -1
            getfield me/alec/Point x I
            invokeinterface java/util/List size ()I
            newarray long
            anewarray java/lang/String
            multianewarray [[I 2
            aconst_null
            return",
        );
        let list = BinaryName::from_string(String::from("java/util/List")).unwrap();
        assert_eq!(
            code.instructions,
            vec![
                Instruction::Push(Constant::Integer(-3)),
                Instruction::Push(Constant::Float(1.5)),
                Instruction::Push(Constant::Long(7)),
                Instruction::Push(Constant::String(String::from("a # b\n"))),
                Instruction::Push(Constant::Class(RefType::array(FieldType::int()))),
                Instruction::Var {
                    opcode: ILOAD,
                    index: 4
                },
                Instruction::IInc { index: 2, value: -1 },
                Instruction::Field {
                    opcode: GETFIELD,
                    owner: BinaryName::from_string(String::from("me/alec/Point")).unwrap(),
                    name: UnqualifiedName::from_string(String::from("x")).unwrap(),
                    descriptor: FieldType::int(),
                },
                Instruction::Method {
                    opcode: INVOKEINTERFACE,
                    owner: list,
                    name: UnqualifiedName::from_string(String::from("size")).unwrap(),
                    descriptor: MethodDescriptor {
                        parameters: vec![],
                        return_type: Some(FieldType::int()),
                    },
                    interface: true,
                },
                Instruction::NewArray(FieldType::long()),
                Instruction::NewArray(FieldType::object(BinaryName::STRING)),
                Instruction::MultiANewArray {
                    class: RefType::array(FieldType::array(FieldType::int())),
                    dimensions: 2,
                },
                Instruction::Simple(ACONST_NULL),
                Instruction::Simple(RETURN),
            ]
        );
    }

    #[test]
    fn labels_and_switches() {
        let code = body(
            "start:
                iload_0
                tableswitch 1 one two default:start
            one:
                lookupswitch -1:two default:one
            two:
                return
            .catch any from start to two using one",
        );
        let labels: Vec<Label> = code
            .instructions
            .iter()
            .filter_map(|insn| match insn {
                Instruction::Label(label) => Some(*label),
                _ => None,
            })
            .collect();
        let [start, one, two] = <[Label; 3]>::try_from(labels).unwrap();

        assert_eq!(
            code.instructions[2],
            Instruction::TableSwitch {
                default: start,
                low: 1,
                targets: vec![one, two],
            }
        );
        assert_eq!(
            code.instructions[4],
            Instruction::LookupSwitch {
                default: one,
                targets: vec![(-1, two)],
            }
        );
        assert_eq!(
            code.exception_ranges,
            vec![ExceptionRange {
                start,
                end: two,
                handler: one,
                catch_type: None,
            }]
        );
    }

    #[test]
    fn errors_have_lines() {
        assert_eq!(error_line(".class A\n.method static f()V\n    frobnicate\n.end method"), 3);
        assert_eq!(error_line(".class A\n.method static f()V\n    goto nowhere\n    return\n.end method"), 3);
        assert_eq!(error_line(".class A\n.method static f()V\na:\na:\n.end method"), 4);
        assert_eq!(error_line(".class A\n.method static f()V\n    return"), 3);
        assert_eq!(error_line("    iconst_0"), 1);
        assert_eq!(error_line(".class A\n.method static f()V\n    bipush 300\n.end method"), 3);
        assert_eq!(error_line(".class A\n.method static f()V\n    ldc 1L\n.end method"), 3);
        assert_eq!(error_line(".class A\n.method static f(\n.end method"), 2);
    }

    #[test]
    fn round_trip_through_display() {
        let source = "\
.class public me/alec/Loop
.super java/lang/Object

.method public static loop(I)I
    .limit stack 2
    .limit locals 2
    iconst_0
    istore_1
top:
    iload_1
    iload_0
    if_icmpge done
    iinc 1 1
    goto top
done:
    iload_1
    ireturn
.end method
";
        let listing = parse(source).unwrap();
        let rendered = listing.to_string();
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(reparsed.to_string(), rendered);

        let code = reparsed.classes[0].methods[0].code_impl.as_ref().unwrap();
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.instructions.len(), 11);
    }
}
