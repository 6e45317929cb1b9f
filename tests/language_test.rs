extern crate rubytree;
use rubytree::test::*;
use rubytree::*;

#[test]
fn local_variables() {
    let program = r#"
        a = 1
        b = a + 2
        a += 10
        b *= 2
        assert(11, a)
        assert(6, b)
        c = d = 5
        assert(5, c)
        assert(5, d)
        x = 3
        assert(2, x -1)
    "#;
    assert_script(program);
}

#[test]
fn if_unless() {
    let program = r#"
        def sign(n)
          if n > 0
            1
          elsif n == 0
            0
          else
            -1
          end
        end
        assert(1, sign(5))
        assert(0, sign(0))
        assert(-1, sign(-5))
        a = 1 unless false
        assert(1, a)
        b = 0
        b = 2 if nil
        assert(0, b)
        assert(nil, if false then 1 end)
        assert(true, !nil)
        assert(false, (not 1))
        assert(2, nil || 2)
        assert(nil, nil && 2)
    "#;
    assert_script(program);
}

#[test]
fn while_break_next() {
    let program = r#"
        i = 0
        sum = 0
        while i < 10
          i += 1
          next if i % 2 == 0
          sum += i
        end
        assert(25, sum)
        j = 0
        res = while true do
          j += 1
          break j * 100 if j == 3
        end
        assert(300, res)
        assert(nil, while false do end)
    "#;
    assert_script(program);
    assert_error("next", RuntimeErrKind::LocalJump);
    assert_error("def f; break; end; f", RuntimeErrKind::LocalJump);
}

#[test]
fn methods_and_return() {
    let program = r#"
        def add(a, b = 10)
          a + b
        end
        assert(3, add(1, 2))
        assert(11, add(1))
        def early(n)
          return "neg" if n < 0
          "pos"
        end
        assert("neg", early(-1))
        assert("pos", early(1))
        def find_first_even(arr)
          i = 0
          while i < arr.size
            return arr[i] if arr[i].even?
            i += 1
          end
          nil
        end
        assert(4, find_first_even([1, 3, 4, 5]))
        assert(nil, find_first_even([1]))
        assert(:foo, def foo; end)
    "#;
    assert_script(program);
    assert_error("def f(a); end; f", RuntimeErrKind::Argument);
    assert_error("def f(a, b = 1); end; f(1, 2, 3)", RuntimeErrKind::Argument);
}

#[test]
fn method_scope() {
    let program = r#"
        x = 1
        def read_x
          x
        end
        def shadow
          x = 100
          x
        end
        assert(1, read_x)
        assert(100, shadow)
        assert(1, x)
    "#;
    assert_script(program);
}

#[test]
fn instance_variables_and_setters() {
    let program = r#"
        class Counter
          def initialize(start = 0)
            @count = start
          end
          def count
            @count
          end
          def count=(v)
            @count = v
          end
          def increment
            @count += 1
            self
          end
        end
        c = Counter.new
        c.increment.increment
        assert(2, c.count)
        c.count = 10
        assert(10, c.count)
        c.count += 5
        assert(15, c.count)
        assert(7, Counter.new(7).count)
    "#;
    assert_script(program);
}

#[test]
fn open_classes_and_operators() {
    let program = r#"
        class Vec2
          attr_reader :x, :y
          def initialize(x, y)
            @x = x
            @y = y
          end
          def +(other)
            Vec2.new(x + other.x, y + other.y)
          end
          def ==(other)
            x == other.x && y == other.y
          end
          def [](i)
            if i == 0 then x else y end
          end
        end
        class Vec2
          def to_s
            "(" + x.to_s + ", " + y.to_s + ")"
          end
        end
        v = Vec2.new(1, 2) + Vec2.new(3, 4)
        assert(Vec2.new(4, 6), v)
        assert(6, v[1])
        assert("(4, 6)", v.to_s)
        assert(true, Vec2.new(1, 1) != Vec2.new(1, 2))
        class Integer
          def double
            self * 2
          end
        end
        assert(10, 5.double)
    "#;
    assert_script(program);
}

#[test]
fn index_assignment() {
    let program = r#"
        a = [1, 2]
        a[0] += 10
        a[2] = 3
        assert([11, 2, 3], a)
    "#;
    assert_script(program);
}

#[test]
fn method_missing() {
    let program = r#"
        class Ghost
          def method_missing(name, arg = nil)
            [name, arg]
          end
        end
        g = Ghost.new
        assert([:boo, nil], g.boo)
        assert([:hello, 1], g.hello(1))
        assert(false, g.respond_to?(:boo))
    "#;
    assert_script(program);
}

#[test]
fn class_level_methods() {
    let program = r#"
        class Registry
          def self.create
            new
          end
          def Registry.label
            "registry"
          end
        end
        assert(Registry, Registry.create.class)
        assert("registry", Registry.label)
    "#;
    assert_script(program);
    assert_error("class R; def self.x; 1; end; end; R.new.x", RuntimeErrKind::NoMethod);
}

#[test]
fn constants() {
    let program = r#"
        LIMIT = 10
        def limit
          LIMIT
        end
        assert(10, limit)
        Alias = String
        assert("s", Alias.new("s"))
    "#;
    assert_script(program);
    assert_error("Nope", RuntimeErrKind::UnresolvedClass);
}

#[test]
fn exceptions() {
    let program = r#"
        log = []
        res = begin
          log << "body"
          raise ArgumentError, "bad"
          log << "unreachable"
        rescue TypeError
          log << "type"
        rescue ArgumentError, RuntimeError => e
          log << "arg"
          e.message
        else
          log << "else"
        ensure
          log << "ensure"
        end
        assert("bad", res)
        assert(["body", "arg", "ensure"], log)

        log = []
        res = begin
          1
        rescue
          2
        else
          3
        ensure
          log << "ensure"
        end
        assert(3, res)
        assert(["ensure"], log)

        def risky
          raise "oops"
        rescue => e
          "rescued " + e.message
        end
        assert("rescued oops", risky)

        class AppError < StandardError; end
        class DbError < AppError; end
        res = begin
          raise DbError, "db down"
        rescue AppError => e
          e.class
        end
        assert(DbError, res)
    "#;
    assert_script(program);
}

#[test]
fn uncaught_exceptions() {
    assert_raise("raise 'x'", "RuntimeError");
    assert_raise(
        "begin; raise ArgumentError; rescue TypeError; end",
        "ArgumentError",
    );
    assert_raise("class E < Exception; end; begin; raise E; rescue; end", "E");

    let mut eval = Evaluator::new();
    let err = eval.run("raise ArgumentError, 'bad value'").unwrap_err();
    assert!(err.is_user_raised());
    assert_eq!("bad value (ArgumentError)", eval.error_message(&err));
}

#[test]
fn host_errors_are_not_rescued() {
    assert_error(
        "begin; nil.wiggle; rescue StandardError; end",
        RuntimeErrKind::NoMethod,
    );
    assert_error("begin; 'a' + 1; rescue => e; end", RuntimeErrKind::Type);
}

#[test]
fn ensure_runs_on_host_error() {
    let (mut eval, output) = buffered_evaluator();
    let err = eval
        .run("begin; nil.wiggle; ensure; puts 'cleanup'; end")
        .unwrap_err();
    assert_eq!(Some(RuntimeErrKind::NoMethod), err.runtime_kind());
    assert_eq!("cleanup\n", output.contents());
}

#[test]
fn parse_errors() {
    let mut eval = Evaluator::new();
    let err = eval.run("def foo").unwrap_err();
    assert!(err.is_unexpected_eof());
    let err = eval.run("1 + )").unwrap_err();
    assert!(err.is_parse_err());
}

#[test]
fn output_functions() {
    let program = r#"
        class Point
          def initialize(x)
            @x = x
          end
          def to_s
            "P" + @x.to_s
          end
        end
        puts Point.new(1)
        print "a", "b"
        puts
        p [1, "two", :three]
        p Point.new(2)
    "#;
    assert_output(program, "P1\nab\n[1, \"two\", :three]\n#<Point @x=2>\n");
}
