use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn daphne(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_daphne"))
        .arg("--no-color")
        .arg("--source")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run daphne")
}

fn blog(root: &Path) {
    write(
        root,
        "_config.toml",
        "[site]\ntitle = \"Test Site\"\ntemplate = \"default\"\n",
    );
    write(root, "_templates/default.html", "<title>{{ page.title }}</title>\n{{ content }}");
    write(
        root,
        "_templates/post.html",
        "{% include header.html %}\n<h1>{{ page.title }}</h1>\n<p>{{ page.date }}</p>\n{{ content }}",
    );
    write(root, "_includes/header.html", "<header>{{ site.title }}</header>");
    write(
        root,
        "index.html",
        "---\ntitle = \"Home\"\n---\n{% foreach site.posts as post %}\n<a href=\"{{ post.url }}\">{{ post.title }}</a>\n{% end foreach %}\n",
    );
    write(
        root,
        "_posts/2024-01-02-first.html",
        "---\ntitle = \"First\"\ntemplate = \"post\"\n---\n{{ post_image(\"a.png\") }}\n",
    );
    write(
        root,
        "_posts/2024-02-03-second.html",
        "---\ntitle = \"Second\"\ntemplate = \"post\"\n---\ntwo\n",
    );
    write(root, "_posts/images/first/a.png", "png");
    write(root, "css/style.css", "body {}");
}

#[test]
fn builds_a_blog() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    blog(root);

    let output = daphne(root, &["build"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "build failed:\n{}", stderr);
    assert!(stderr.contains("build result: ok. 3 built"), "{}", stderr);

    let index = fs::read_to_string(root.join("_build/index.html")).unwrap();
    assert_eq!(
        index,
        "<title>Home</title>\n<a href=\"/blog/second/\">Second</a>\n<a href=\"/blog/first/\">First</a>\n"
    );

    let first = fs::read_to_string(root.join("_build/blog/first/index.html")).unwrap();
    assert_eq!(
        first,
        "<header>Test Site</header>\n<h1>First</h1>\n<p>January 2, 2024</p>\na.png\n"
    );
    assert_eq!(fs::read_to_string(root.join("_build/blog/first/a.png")).unwrap(), "png");
    assert_eq!(fs::read_to_string(root.join("_build/css/style.css")).unwrap(), "body {}");
    assert!(!root.join("_build/_templates").exists());
}

#[test]
fn no_subcommand_means_build() {
    let dir = tempfile::tempdir().unwrap();
    blog(dir.path());
    write(dir.path(), "_build/stale.html", "old");

    let output = daphne(dir.path(), &[]);
    assert!(output.status.success());
    assert!(dir.path().join("_build/index.html").exists());
    assert!(!dir.path().join("_build/stale.html").exists());
}

#[test]
fn broken_page_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    blog(root);
    write(root, "broken.html", "---\n---\n{% end if %}\n");

    let output = daphne(root, &["build"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("FAIL   broken.html"), "{}", stderr);
    assert!(stderr.contains("'end if' does not close any open block"), "{}", stderr);
    assert!(stderr.contains("1 failed"), "{}", stderr);
    assert!(root.join("_build/index.html").exists());
}

#[test]
fn missing_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = daphne(dir.path(), &["build"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("_config.toml"));
}

#[test]
fn new_then_new_post() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    assert!(daphne(root, &["new"]).status.success());
    assert!(root.join("_config.toml").is_file());
    assert!(root.join("_templates").is_dir());

    let output = daphne(root, &["new-post", "My", "First", "Post"]);
    assert!(output.status.success());
    let posts: Vec<_> = fs::read_dir(root.join("_posts"))
        .unwrap()
        .flatten()
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(".html"))
        .collect();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].ends_with("-my-first-post.html"), "{:?}", posts);
    assert!(root.join("_posts/images/my-first-post").is_dir());
}
