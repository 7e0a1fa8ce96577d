use jvm_frames::jvm::class_file::{EncodedFrame, Serialize, StackMapTable};
use jvm_frames::jvm::class_graph::{ClassGraph, ClassGraphArenas};
use jvm_frames::jvm::code::{Code, Instruction};
use jvm_frames::jvm::verifier::VerificationType;
use jvm_frames::jvm::{Compute, Settings};
use jvm_frames::listing::{self, Listing};

/// Parse the listing and recompute its frames against a hierarchy with the Java standard types
fn recompute(source: &str, settings: &Settings) -> Listing {
    let mut listing = listing::parse(source).unwrap();
    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    class_graph.insert_java_library_types();
    listing.declare_in(&class_graph);
    listing
        .recompute_all(Some(&class_graph), settings)
        .unwrap();
    listing
}

fn code<'a>(listing: &'a Listing, name: &str) -> &'a Code {
    listing
        .classes
        .iter()
        .flat_map(|class| class.methods.iter())
        .find(|method| method.name.to_string() == name)
        .and_then(|method| method.code_impl.as_ref())
        .unwrap()
}

fn rendered_frames(code: &Code) -> Vec<String> {
    code.frames
        .iter()
        .map(|(_, frame)| frame.to_string())
        .collect()
}

const LOCALS_COME_AND_GO: &str = "
.class me/alec/Test
.method static shuffle(III)V
    aconst_null
    checkcast me/alec/Foo
    astore_3
    iconst_0
    istore 4
    iload_0
    ifeq other
    fconst_0
    fstore_3
    fconst_0
    fstore 4
    goto merge
other:
    iinc 0 1
    goto merge
merge:
    iload_1
    ifeq end
    iconst_0
    pop
end:
    return
.end method
";

#[test]
fn frames_are_compacted() {
    let listing = recompute(LOCALS_COME_AND_GO, &Settings::default());
    let code = code(&listing, "shuffle");

    assert_eq!(
        rendered_frames(code),
        vec!["append [me/alec/Foo, int]", "chop 2", "same"]
    );
    assert_eq!(code.max_locals, 5);
    assert_eq!(code.max_stack, 1);
}

#[test]
fn handler_sees_joined_catch_types() {
    let listing = recompute(
        "
        .class me/alec/Test
        .method static divide()V
        start:
            iconst_1
            iconst_0
            idiv
            pop
        end:
            return
        handler:
            astore_0
            return
            .catch java/lang/ArithmeticException from start to end using handler
            .catch java/lang/NullPointerException from start to end using handler
        .end method
        ",
        &Settings::default(),
    );

    assert_eq!(
        rendered_frames(code(&listing, "divide")),
        vec!["same_locals_1_stack_item java/lang/RuntimeException"]
    );
}

#[test]
fn handler_reached_by_fallthrough() {
    let listing = recompute(
        "
        .class me/alec/Test
        .method static spill()V
        start:
            iconst_1
            iconst_2
        end:
        handler:
            pop
            return
            .catch any from start to end using handler
        .end method
        ",
        &Settings::default(),
    );
    let code = code(&listing, "spill");

    assert_eq!(
        rendered_frames(code),
        vec!["same_locals_1_stack_item java/lang/Throwable"]
    );
    assert_eq!(code.max_stack, 2);
}

#[test]
fn loop_joins_sibling_classes() {
    let listing = recompute(
        "
        .class abstract me/alec/Shape
        .class me/alec/Circle
        .super me/alec/Shape
        .class me/alec/Square
        .super me/alec/Shape

        .class me/alec/Test
        .method static last(I)Lme/alec/Shape;
            aconst_null
            checkcast me/alec/Circle
            astore_1
        top:
            iload_0
            ifeq done
            aconst_null
            checkcast me/alec/Square
            astore_1
            iinc 0 -1
            goto top
        done:
            aload_1
            areturn
        .end method
        ",
        &Settings::default(),
    );

    assert_eq!(
        rendered_frames(code(&listing, "last")),
        vec!["append [me/alec/Shape]", "same"]
    );
}

#[test]
fn uninitialized_this_in_constructor() {
    let listing = recompute(
        "
        .class me/alec/Point
        .method public <init>(Z)V
            aload_0
            iload_1
            ifeq skip
            nop
        skip:
            invokespecial java/lang/Object <init> ()V
            return
        .end method
        ",
        &Settings::default(),
    );

    assert_eq!(
        rendered_frames(code(&listing, "<init>")),
        vec!["same_locals_1_stack_item uninitialized_this"]
    );
}

#[test]
fn allocation_sites_get_labels() {
    let listing = recompute(
        "
        .class me/alec/Test
        .method static make(Z)Ljava/lang/Object;
            new java/lang/Object
            dup
            iload_0
            ifeq skip
            nop
        skip:
            invokespecial java/lang/Object <init> ()V
            areturn
        .end method
        ",
        &Settings::default(),
    );
    let code = code(&listing, "make");

    let site = match code.instructions[0] {
        Instruction::Label(label) => label,
        ref other => panic!("expected a label in front of `new`, found {}", other),
    };
    assert_eq!(code.instructions.len(), 9);
    assert_eq!(
        rendered_frames(code),
        vec![format!(
            "full [int] [uninitialized({0}), uninitialized({0})]",
            site
        )]
    );
}

#[test]
fn unreachable_blocks_have_no_frames() {
    let listing = recompute(
        "
        .class me/alec/Test
        .method static dead()V
            goto end
        spin:
            goto spin
        end:
            return
        .end method
        ",
        &Settings::default(),
    );
    let code = code(&listing, "dead");

    assert_eq!(rendered_frames(code), vec!["same"]);
    let label = code.frames[0].0;
    assert_eq!(code.position_of(label), Some(code.instructions.len() - 2));
}

#[test]
fn recomputing_is_idempotent() {
    let once = recompute(LOCALS_COME_AND_GO, &Settings::default());
    let mut twice = once.clone();

    let arenas = ClassGraphArenas::new();
    let class_graph = ClassGraph::new(&arenas);
    class_graph.insert_java_library_types();
    twice.declare_in(&class_graph);
    twice
        .recompute_all(Some(&class_graph), &Settings::default())
        .unwrap();

    assert_eq!(once.to_string(), twice.to_string());
}

#[test]
fn maxes_only_leaves_frames_alone() {
    let listing = recompute(LOCALS_COME_AND_GO, &Settings::new(Compute::Maxes));
    let code = code(&listing, "shuffle");

    assert!(code.frames.is_empty());
    assert_eq!(code.max_locals, 5);
    assert_eq!(code.max_stack, 1);
}

#[test]
fn nothing_keeps_declared_limits() {
    let listing = recompute(
        "
        .class me/alec/Test
        .method static noop()V
            .limit stack 7
            .limit locals 3
            return
        .end method
        ",
        &Settings::new(Compute::Nothing),
    );
    let code = code(&listing, "noop");

    assert_eq!((code.max_stack, code.max_locals), (7, 3));
    assert!(code.frames.is_empty());
}

#[test]
fn encoded_stack_map_table() {
    let listing = recompute(LOCALS_COME_AND_GO, &Settings::default());
    let code = code(&listing, "shuffle");

    // Pretend every instruction is one byte wide
    let table = StackMapTable::from_frames(
        &code.frames,
        |label| code.position_of(label).map(|pos| pos as u16),
        |_| 42,
    )
    .unwrap();

    assert_eq!(table.0.len(), 3);
    assert!(matches!(
        &table.0[0],
        EncodedFrame::AppendLocalsNoStack { locals, .. }
            if locals == &vec![VerificationType::Object(42), VerificationType::Integer]
    ));
    assert!(matches!(
        table.0[1],
        EncodedFrame::ChopLocalsNoStack { chopped_k: 2, .. }
    ));
    assert!(matches!(table.0[2], EncodedFrame::SameLocalsNoStack { .. }));

    let mut bytes = vec![];
    table.serialize(&mut bytes).unwrap();
    assert_eq!(&bytes[..5], &[0, 3, 253, 0, 12]);
}
