use persian_wordcloud::create_persian_wordcloud;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let sample_texts = vec![
        // Technology
        "سلام دنیا",
        "این یک متن نمونه است",
        "ابر کلمات فارسی",
        "یادگیری ماشین و هوش مصنوعی",
        "برنامه نویسی و توسعه نرم افزار",
        "داده کاوی و تحلیل اطلاعات",
        "وب و اینترنت",
        "امنیت و رمزنگاری",
        "پایگاه داده و ذخیره اطلاعات",
        "الگوریتم و ساختار داده",
        "شبکه و ارتباطات",
        "فناوری و نوآوری",
        // Science and education
        "علم و دانش",
        "تحقیقات علمی",
        "کتابخانه و مطالعه",
        "دانشگاه و تحصیل",
        "استاد و دانشجو",
        "کتاب و مقاله",
        "کنفرانس و همایش",
        "پروژه تحقیقاتی",
        // Culture
        "فرهنگ و هنر",
        "موسیقی و آواز",
        "سینما و فیلم",
        "ادبیات و شعر",
        "نقاشی و طراحی",
        "کتاب و داستان",
        // Nature
        "طبیعت و محیط زیست",
        "درخت و جنگل",
        "دریا و اقیانوس",
        "کوه و دشت",
        "خورشید و ماه",
        "ستاره و آسمان",
    ];

    let start = Instant::now();
    let output = create_persian_wordcloud(&sample_texts, Path::new("demos/config.json"), None)?;
    println!("Saved to {} in {:?}", output.display(), start.elapsed());
    Ok(())
}
