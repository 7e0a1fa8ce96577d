use super::{BinaryName, ClassAccessFlags, ClassGraph, ClassId};

/// Classes inside `java.*`
///
/// These are the runtime types most likely to show up when joining object types: the boxed
/// primitives, strings, the common exception hierarchy, and the interfaces arrays implement.
pub struct JavaClasses<'g> {
    pub lang: LangClasses<'g>,
    pub io: IoClasses<'g>,
}

/// Classes inside `java.lang.*`
pub struct LangClasses<'g> {
    pub object: ClassId<'g>,
    pub cloneable: ClassId<'g>,
    pub comparable: ClassId<'g>,
    pub char_sequence: ClassId<'g>,
    pub string: ClassId<'g>,
    pub string_builder: ClassId<'g>,
    pub class: ClassId<'g>,
    pub number: ClassId<'g>,
    pub integer: ClassId<'g>,
    pub float: ClassId<'g>,
    pub long: ClassId<'g>,
    pub double: ClassId<'g>,
    pub void: ClassId<'g>,
    pub boolean: ClassId<'g>,
    pub invoke: InvokeClasses<'g>,
    pub throwable: ClassId<'g>,
    pub error: ClassId<'g>,
    pub exception: ClassId<'g>,
    pub runtime_exception: ClassId<'g>,
    pub arithmetic_exception: ClassId<'g>,
    pub illegal_argument_exception: ClassId<'g>,
    pub illegal_state_exception: ClassId<'g>,
    pub null_pointer_exception: ClassId<'g>,
    pub class_cast_exception: ClassId<'g>,
    pub index_out_of_bounds_exception: ClassId<'g>,
    pub array_index_out_of_bounds_exception: ClassId<'g>,
}

/// Classes inside `java.lang.invoke.*`
pub struct InvokeClasses<'g> {
    pub method_type: ClassId<'g>,
    pub method_handle: ClassId<'g>,
    pub call_site: ClassId<'g>,
}

/// Classes inside `java.io.*`
pub struct IoClasses<'g> {
    pub serializable: ClassId<'g>,
    pub io_exception: ClassId<'g>,
}

const CLASS: ClassAccessFlags = ClassAccessFlags::from_bits_truncate(
    ClassAccessFlags::PUBLIC.bits() | ClassAccessFlags::SUPER.bits(),
);
const FINAL_CLASS: ClassAccessFlags = ClassAccessFlags::from_bits_truncate(
    CLASS.bits() | ClassAccessFlags::FINAL.bits(),
);
const ABSTRACT_CLASS: ClassAccessFlags = ClassAccessFlags::from_bits_truncate(
    CLASS.bits() | ClassAccessFlags::ABSTRACT.bits(),
);
const INTERFACE: ClassAccessFlags = ClassAccessFlags::from_bits_truncate(
    ClassAccessFlags::PUBLIC.bits()
        | ClassAccessFlags::INTERFACE.bits()
        | ClassAccessFlags::ABSTRACT.bits(),
);

impl<'g> JavaClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> JavaClasses<'g> {
        let io = IoClasses::add_to_graph(class_graph);
        let lang = LangClasses::add_to_graph(class_graph);
        JavaClasses { lang, io }
    }
}

impl<'g> LangClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> LangClasses<'g> {
        let object_name = BinaryName::OBJECT;
        let object = class_graph.declare(&object_name, None, &[], CLASS);
        let extends_object = Some(&object_name);
        let serializable = [BinaryName::SERIALIZABLE];

        let cloneable = class_graph.declare(&BinaryName::CLONEABLE, extends_object, &[], INTERFACE);
        let comparable =
            class_graph.declare(&BinaryName::COMPARABLE, extends_object, &[], INTERFACE);
        let char_sequence =
            class_graph.declare(&BinaryName::CHARSEQUENCE, extends_object, &[], INTERFACE);
        let string = class_graph.declare(
            &BinaryName::STRING,
            extends_object,
            &[
                BinaryName::SERIALIZABLE,
                BinaryName::COMPARABLE,
                BinaryName::CHARSEQUENCE,
            ],
            FINAL_CLASS,
        );
        let string_builder = class_graph.declare(
            &BinaryName::STRINGBUILDER,
            extends_object,
            &[BinaryName::SERIALIZABLE, BinaryName::CHARSEQUENCE],
            FINAL_CLASS,
        );
        let class = class_graph.declare(&BinaryName::CLASS, extends_object, &serializable, FINAL_CLASS);

        let number =
            class_graph.declare(&BinaryName::NUMBER, extends_object, &serializable, ABSTRACT_CLASS);
        let boxed = [BinaryName::COMPARABLE];
        let number_name = BinaryName::NUMBER;
        let extends_number = Some(&number_name);
        let integer = class_graph.declare(&BinaryName::INTEGER, extends_number, &boxed, FINAL_CLASS);
        let float = class_graph.declare(&BinaryName::FLOAT, extends_number, &boxed, FINAL_CLASS);
        let long = class_graph.declare(&BinaryName::LONG, extends_number, &boxed, FINAL_CLASS);
        let double = class_graph.declare(&BinaryName::DOUBLE, extends_number, &boxed, FINAL_CLASS);
        let boolean = class_graph.declare(
            &BinaryName::BOOLEAN,
            extends_object,
            &[BinaryName::SERIALIZABLE, BinaryName::COMPARABLE],
            FINAL_CLASS,
        );
        let void = class_graph.declare(&BinaryName::VOID, extends_object, &[], FINAL_CLASS);

        let invoke = InvokeClasses::add_to_graph(class_graph);

        let throwable =
            class_graph.declare(&BinaryName::THROWABLE, extends_object, &serializable, CLASS);
        let error = class_graph.declare(&BinaryName::ERROR, Some(&BinaryName::THROWABLE), &[], CLASS);
        let exception =
            class_graph.declare(&BinaryName::EXCEPTION, Some(&BinaryName::THROWABLE), &[], CLASS);
        let runtime_exception = class_graph.declare(
            &BinaryName::RUNTIMEEXCEPTION,
            Some(&BinaryName::EXCEPTION),
            &[],
            CLASS,
        );
        let runtime_name = BinaryName::RUNTIMEEXCEPTION;
        let extends_runtime = Some(&runtime_name);
        let arithmetic_exception =
            class_graph.declare(&BinaryName::ARITHMETICEXCEPTION, extends_runtime, &[], CLASS);
        let illegal_argument_exception =
            class_graph.declare(&BinaryName::ILLEGALARGUMENTEXCEPTION, extends_runtime, &[], CLASS);
        let illegal_state_exception =
            class_graph.declare(&BinaryName::ILLEGALSTATEEXCEPTION, extends_runtime, &[], CLASS);
        let null_pointer_exception =
            class_graph.declare(&BinaryName::NULLPOINTEREXCEPTION, extends_runtime, &[], CLASS);
        let class_cast_exception =
            class_graph.declare(&BinaryName::CLASSCASTEXCEPTION, extends_runtime, &[], CLASS);
        let index_out_of_bounds_exception = class_graph.declare(
            &BinaryName::INDEXOUTOFBOUNDSEXCEPTION,
            extends_runtime,
            &[],
            CLASS,
        );
        let array_index_out_of_bounds_exception = class_graph.declare(
            &BinaryName::ARRAYINDEXOUTOFBOUNDSEXCEPTION,
            Some(&BinaryName::INDEXOUTOFBOUNDSEXCEPTION),
            &[],
            CLASS,
        );

        LangClasses {
            object,
            cloneable,
            comparable,
            char_sequence,
            string,
            string_builder,
            class,
            number,
            integer,
            float,
            long,
            double,
            void,
            boolean,
            invoke,
            throwable,
            error,
            exception,
            runtime_exception,
            arithmetic_exception,
            illegal_argument_exception,
            illegal_state_exception,
            null_pointer_exception,
            class_cast_exception,
            index_out_of_bounds_exception,
            array_index_out_of_bounds_exception,
        }
    }
}

impl<'g> InvokeClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> InvokeClasses<'g> {
        let object_name = BinaryName::OBJECT;
        let extends_object = Some(&object_name);
        let method_type = class_graph.declare(
            &BinaryName::METHODTYPE,
            extends_object,
            &[BinaryName::SERIALIZABLE],
            FINAL_CLASS,
        );
        let method_handle =
            class_graph.declare(&BinaryName::METHODHANDLE, extends_object, &[], ABSTRACT_CLASS);
        let call_site =
            class_graph.declare(&BinaryName::CALLSITE, extends_object, &[], ABSTRACT_CLASS);

        InvokeClasses {
            method_type,
            method_handle,
            call_site,
        }
    }
}

impl<'g> IoClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> IoClasses<'g> {
        let serializable = class_graph.declare(
            &BinaryName::SERIALIZABLE,
            Some(&BinaryName::OBJECT),
            &[],
            INTERFACE,
        );
        let io_exception = class_graph.declare(
            &BinaryName::IOEXCEPTION,
            Some(&BinaryName::EXCEPTION),
            &[],
            CLASS,
        );
        IoClasses {
            serializable,
            io_exception,
        }
    }
}
